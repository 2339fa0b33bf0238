//! Concurrent fan-out of chunks to workers.
//!
//! The dispatcher knows nothing about transports. It talks to workers through
//! the [`WorkerHandle`] trait, issues every call before awaiting any of them,
//! and only returns once *all* calls have finished (a full barrier). Results
//! are returned in worker order regardless of the order in which calls
//! completed.

use crate::{Chunk, Error, Result, WorkerError, kernel::Sampler};
use core::{future::Future, time::Duration};
use futures::future::join_all;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// A compute endpoint able to run the sampling kernel on request.
///
/// Implementations may be remote (an RPC client) or local. Each call is
/// independent and stateless from the dispatcher's point of view; a handle may
/// be invoked concurrently with other handles, and must be `Sync` so the
/// dispatcher can hold shared references across the join.
pub trait WorkerHandle: Send + Sync {
    /// Runs `chunk_size` trials and returns the number of hits.
    fn invoke(
        &self,
        chunk_size: u64,
    ) -> impl Future<Output = core::result::Result<u64, WorkerError>> + Send;
}

impl<T> WorkerHandle for Arc<T>
where
    T: WorkerHandle,
{
    fn invoke(
        &self,
        chunk_size: u64,
    ) -> impl Future<Output = core::result::Result<u64, WorkerError>> + Send {
        (**self).invoke(chunk_size)
    }
}

/// The outcome of one chunk: how many of its trials were hits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PartialResult {
    pub chunk: Chunk,
    pub hits: u64,
}

/// Knobs applied to every call of a single [`dispatch`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Deadline for each individual worker call. `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
}

impl DispatchOptions {
    pub const fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }
}

/// Sends `chunks[i]` to `workers[i]` for every `i`, concurrently, and waits
/// for all of them.
///
/// # Errors
///
/// - [`Error::InvalidArgument`] if `workers` and `chunks` differ in length or
///   a chunk is not positioned at its own `worker_index`.
/// - [`Error::WorkerFailure`] if any call failed, timed out, or reported more
///   hits than trials. When several workers fail, the lowest index is
///   reported. No partial results are returned.
pub async fn dispatch<H>(
    workers: &[H],
    chunks: &[Chunk],
    options: &DispatchOptions,
) -> Result<Vec<PartialResult>>
where
    H: WorkerHandle,
{
    if workers.len() != chunks.len() {
        return Err(Error::InvalidArgument {
            reason: format!(
                "{} workers cannot run {} chunks",
                workers.len(),
                chunks.len()
            ),
        });
    }

    if let Some((position, chunk)) = chunks
        .iter()
        .enumerate()
        .find(|(position, chunk)| chunk.worker_index != *position)
    {
        return Err(Error::InvalidArgument {
            reason: format!(
                "chunk at position {position} is assigned to worker {}",
                chunk.worker_index
            ),
        });
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("Dispatching {} chunks", chunks.len());

    // Build every call first so they are all in flight before the join.
    let calls = workers
        .iter()
        .zip(chunks)
        .map(|(worker, &chunk)| async move {
            let outcome = match options.call_timeout {
                Some(after) => tokio::time::timeout(after, worker.invoke(chunk.size))
                    .await
                    .unwrap_or(Err(WorkerError::Timeout { after })),
                None => worker.invoke(chunk.size).await,
            };
            (chunk, outcome.and_then(|hits| check_range(chunk, hits)))
        });

    let outcomes = join_all(calls).await;

    let mut results = Vec::with_capacity(outcomes.len());
    let mut failure = None;

    for (chunk, outcome) in outcomes {
        match outcome {
            Ok(hits) => results.push(PartialResult { chunk, hits }),
            Err(cause) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Worker {} failed: {}", chunk.worker_index, cause);

                if failure.is_none() {
                    failure = Some(Error::WorkerFailure {
                        worker_index: chunk.worker_index,
                        cause,
                    });
                }
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(results),
    }
}

fn check_range(chunk: Chunk, hits: u64) -> core::result::Result<u64, WorkerError> {
    if hits > chunk.size {
        Err(WorkerError::OutOfRange {
            hits,
            chunk_size: chunk.size,
        })
    } else {
        Ok(hits)
    }
}

/// A [`WorkerHandle`] that runs the kernel in-process on the polling task.
///
/// Every call gets its own generator. The `k`-th call of a seeded worker draws
/// from `Sampler::stream(seed, k)`, so its first call matches a sequential run
/// with the same seed.
#[derive(Debug, Default)]
pub struct LocalWorker {
    seed: Option<u64>,
    calls: AtomicU64,
}

impl LocalWorker {
    /// A worker seeding each call from entropy.
    pub const fn new() -> Self {
        Self {
            seed: None,
            calls: AtomicU64::new(0),
        }
    }

    /// A worker with a deterministic sequence of per-call seeds.
    pub const fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            calls: AtomicU64::new(0),
        }
    }

    fn next_sampler(&self) -> Sampler {
        match self.seed {
            Some(seed) => {
                let call = self.calls.fetch_add(1, Ordering::Relaxed);
                Sampler::stream(seed, call)
            }
            None => Sampler::from_entropy(),
        }
    }
}

impl WorkerHandle for LocalWorker {
    fn invoke(
        &self,
        chunk_size: u64,
    ) -> impl Future<Output = core::result::Result<u64, WorkerError>> + Send {
        let mut sampler = self.next_sampler();
        async move { Ok(sampler.sample(chunk_size)) }
    }
}
