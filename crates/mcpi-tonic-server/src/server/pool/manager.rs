//! Round-robin pool of sampler threads.
//!
//! This module defines the [`WorkerPool`] struct, which owns the sending side
//! of every sampler thread's bounded channel. Chunks are handed out
//! round-robin and each caller waits on its own oneshot reply, so any number of
//! concurrent gRPC requests can be in flight while every thread runs at most
//! one chunk at a time.
//!
//! Shutdown happens in stages: refuse new chunks, drain the ones in flight,
//! cancel whatever is left, then stop every thread.

use crate::server::pool::request::WorkRequest;
use core::time::Duration;
use mcpi_tonic_core::Error;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::{
    sync::{mpsc, oneshot},
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

/// A pool of blocking sampler threads fed through bounded MPSC channels.
pub struct WorkerPool {
    workers: Vec<mpsc::Sender<WorkRequest>>,
    next_worker: AtomicUsize,
    inflight: AtomicUsize,
    refusing: AtomicBool,
    shutdown_token: CancellationToken,
    shutdown_timeout: Duration,
}

/// Counts a chunk as in flight for as long as it is alive.
struct InflightGuard<'a>(&'a AtomicUsize);

impl<'a> InflightGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl WorkerPool {
    /// Constructs a new [`WorkerPool`] from initialized worker channels and a
    /// shared cancellation token.
    pub const fn new(
        workers: Vec<mpsc::Sender<WorkRequest>>,
        shutdown_token: CancellationToken,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            workers,
            next_worker: AtomicUsize::new(0),
            inflight: AtomicUsize::new(0),
            refusing: AtomicBool::new(false),
            shutdown_token,
            shutdown_timeout,
        }
    }

    /// Returns the index of the next worker to receive work (round-robin).
    pub fn next_worker_index(&self) -> usize {
        self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Number of chunks currently accepted and not yet answered.
    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::SeqCst)
    }

    /// Runs `iterations` trials on the next sampler thread and returns the hit
    /// count.
    ///
    /// # Errors
    ///
    /// - [`Error::ServiceShutdown`] if the pool is shutting down, or was
    ///   cancelled while this chunk was still running.
    /// - [`Error::ChannelError`] if the thread is gone.
    pub async fn sample(&self, iterations: u64) -> Result<u64, Error> {
        // Count first, then check: a drain that starts after this point will
        // wait for us.
        let _guard = InflightGuard::new(&self.inflight);
        if self.refusing.load(Ordering::SeqCst) {
            return Err(Error::ServiceShutdown);
        }

        let (tx, rx) = oneshot::channel();
        self.send_to_next_worker(WorkRequest::Sample {
            iterations,
            response: tx,
        })
        .await?;

        tokio::select! {
            hits = rx => hits.map_err(|_| Error::ChannelError {
                context: "Worker dropped the response channel".to_string(),
            }),
            () = self.shutdown_token.cancelled() => Err(Error::ServiceShutdown),
        }
    }

    /// Sends a [`WorkRequest`] to the next worker in the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The service is shutting down (`shutdown_token` was cancelled).
    /// - The worker's channel is closed.
    pub async fn send_to_next_worker(&self, request: WorkRequest) -> Result<(), Error> {
        if self.shutdown_token.is_cancelled() {
            return Err(Error::ServiceShutdown);
        }

        let worker_idx = self.next_worker_index();
        let worker = &self.workers[worker_idx];

        tokio::select! {
            sent = worker.send(request) => sent.map_err(|_| Error::ChannelError {
                context: format!("Worker {worker_idx} channel closed"),
            }),
            () = self.shutdown_token.cancelled() => Err(Error::ServiceShutdown),
        }
    }

    /// Gracefully shuts down all workers in the pool.
    ///
    /// - Refuses new chunks with [`Error::ServiceShutdown`].
    /// - Waits up to `shutdown_timeout` for in-flight chunks to finish.
    /// - Cancels the shared [`CancellationToken`] so remaining callers return.
    /// - Sends a [`WorkRequest::Shutdown`] to each worker and waits (up to 3
    ///   seconds per worker) for the acknowledgement.
    pub async fn shutdown(&self) -> Result<(), Error> {
        // === Phase 0: Stop accepting new chunks ===
        #[cfg(feature = "tracing")]
        tracing::info!("Refusing new requests");
        self.refusing.store(true, Ordering::SeqCst);

        // === Phase 1: Wait for in-flight chunks to drain ===
        #[cfg(feature = "tracing")]
        tracing::info!("Draining in-flight chunks ({} active)", self.inflight());
        let drain_result = timeout(self.shutdown_timeout, async {
            while self.inflight() > 0 {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        match drain_result {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("All in-flight chunks drained successfully");
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "Graceful drain timed out ({} chunks still active)",
                    self.inflight()
                );
            }
        }

        // === Phase 2: Cancel any remaining work ===
        #[cfg(feature = "tracing")]
        tracing::debug!("Cancelling remaining work via shutdown token");
        self.shutdown_token.cancel();

        // === Phase 3: Notify workers to shut down ===
        #[cfg(feature = "tracing")]
        tracing::debug!("Notifying all workers to shut down");
        let mut shutdown_handles = Vec::with_capacity(self.workers.len());

        for (i, worker) in self.workers.iter().enumerate() {
            let (tx, rx) = oneshot::channel();
            // A thread still busy with a cancelled chunk holds its slot until
            // the chunk completes.
            match timeout(
                Duration::from_secs(3),
                worker.send(WorkRequest::Shutdown { response: tx }),
            )
            .await
            {
                Ok(Ok(())) => shutdown_handles.push((i, rx)),
                Ok(Err(_e)) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Failed to send shutdown to worker {i}: {_e}");
                }
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Worker {i} is busy, skipping shutdown notification");
                }
            }
        }

        let timeout_futures = shutdown_handles.into_iter().map(|(_i, rx)| async move {
            match timeout(Duration::from_secs(3), rx).await {
                Ok(Ok(())) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!("Worker {_i} shutdown acknowledged");
                }
                Ok(Err(_e)) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker {_i} returned error: {_e}");
                }
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Worker {_i} shutdown timed out");
                }
            }
        });

        futures::future::join_all(timeout_futures).await;

        #[cfg(feature = "tracing")]
        tracing::info!("Worker pool shutdown complete");

        Ok(())
    }
}
