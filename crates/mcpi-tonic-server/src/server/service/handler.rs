//! gRPC service implementation for chunked Monte Carlo sampling.
//!
//! This module defines [`PiWorkerService`], the concrete implementation of the
//! `PiWorker` gRPC service. Each `CalculatePiChunk` call is validated, then
//! handed to the [`WorkerPool`] which runs it on one of its sampler threads.

use crate::server::{
    config::ServerConfig,
    pool::{manager::WorkerPool, worker::worker_loop},
    telemetry::{
        ChunkInflightGuard, increment_chunk_errors, increment_iterations_sampled,
        increment_requests, record_chunk_duration,
    },
};
use mcpi_tonic_core::{
    Error,
    proto::{ChunkRequest, ChunkResponse, pi_worker_server::PiWorker},
    types::Generator,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};

/// gRPC worker that answers chunk requests from the solver.
///
/// Cloning is cheap; every clone shares the same pool of sampler threads.
#[derive(Clone)]
pub struct PiWorkerService {
    config: ServerConfig,
    worker_pool: Arc<WorkerPool>,
}

impl PiWorkerService {
    /// Creates a new `PiWorkerService` and starts `config.num_workers` sampler
    /// threads.
    ///
    /// Thread `i` owns a [`Generator`] on stream `i` of `config.seed`, or from
    /// OS entropy when no seed is configured. Each thread has a request
    /// buffer of one: it runs a single chunk at a time and the next request
    /// waits in the pool until it is free.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: ServerConfig) -> Self {
        let mut workers = Vec::with_capacity(config.num_workers);
        let shutdown_token = CancellationToken::new();

        for worker_id in 0..config.num_workers {
            let (tx, rx) = mpsc::channel(1);
            workers.push(tx);

            let generator = match config.seed_for(worker_id) {
                Some(seed) => Generator::seeded(seed),
                None => Generator::from_entropy(),
            };

            tokio::task::spawn_blocking(move || worker_loop(worker_id, rx, generator));
        }

        let worker_pool = WorkerPool::new(workers, shutdown_token, config.shutdown_timeout);

        Self {
            config,
            worker_pool: Arc::new(worker_pool),
        }
    }

    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Initiates a graceful shutdown of the worker pool.
    ///
    /// New requests are refused with `UNAVAILABLE`, in-flight ones get
    /// `shutdown_timeout` to finish, and the call returns once every sampler
    /// thread has acknowledged termination.
    pub async fn shutdown(&self) -> Result<(), Error> {
        self.worker_pool.shutdown().await
    }
}

#[tonic::async_trait]
impl PiWorker for PiWorkerService {
    /// Runs `iterations` trials on one sampler thread and answers with the
    /// hit count.
    ///
    /// Rejects requests above `max_allowed_iterations` with
    /// `INVALID_ARGUMENT` and requests received during shutdown with
    /// `UNAVAILABLE`.
    ///
    /// If `metrics` is enabled, emits telemetry for:
    /// - request rate
    /// - chunks in flight
    /// - trials sampled
    /// - chunk duration
    /// - chunk errors
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(iterations = req.get_ref().iterations)))]
    async fn calculate_pi_chunk(
        &self,
        req: Request<ChunkRequest>,
    ) -> Result<Response<ChunkResponse>, Status> {
        let start = std::time::Instant::now();
        let iterations = req.into_inner().iterations;

        if iterations > self.config.max_allowed_iterations {
            increment_chunk_errors();
            return Err(Error::InvalidRequest {
                reason: format!(
                    "Iterations {} exceed maximum allowed ({})",
                    iterations, self.config.max_allowed_iterations
                ),
            }
            .into());
        }

        increment_requests();
        let inflight = ChunkInflightGuard::new();
        let result = self.worker_pool.sample(iterations).await;
        drop(inflight);

        match result {
            Ok(hits) => {
                increment_iterations_sampled(iterations);
                record_chunk_duration(start.elapsed().as_secs_f64() * 1000.0);

                #[cfg(feature = "tracing")]
                tracing::debug!(hits, "Chunk complete");

                Ok(Response::new(ChunkResponse { hits }))
            }
            Err(e) => {
                increment_chunk_errors();

                #[cfg(feature = "tracing")]
                tracing::warn!("Chunk failed: {}", e);

                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use tonic::Code;

    fn config(num_workers: usize, max_allowed_iterations: u64) -> ServerConfig {
        ServerConfig {
            max_allowed_iterations,
            num_workers,
            seed: Some(100),
            shutdown_timeout: Duration::from_millis(200),
            ..ServerConfig::default()
        }
    }

    async fn call(service: &PiWorkerService, iterations: u64) -> Result<u64, Status> {
        service
            .calculate_pi_chunk(Request::new(ChunkRequest { iterations }))
            .await
            .map(|resp| resp.into_inner().hits)
    }

    #[tokio::test]
    async fn answers_with_the_seeded_thread_draws() {
        let service = PiWorkerService::new(config(1, 1_000_000));

        let hits = call(&service, 20_000).await.unwrap();

        assert_eq!(hits, Generator::stream(100, 0).sample(20_000));
    }

    #[tokio::test]
    async fn zero_iterations_is_zero_hits() {
        let service = PiWorkerService::new(config(2, 10));
        assert_eq!(call(&service, 0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn oversized_chunk_is_invalid_argument() {
        let service = PiWorkerService::new(config(2, 1_000));

        assert!(call(&service, 1_000).await.unwrap() <= 1_000);

        let status = call(&service, 1_001).await.unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(
            status.message(),
            "Iterations 1001 exceed maximum allowed (1000)"
        );
    }

    #[tokio::test]
    async fn shut_down_service_is_unavailable() {
        let service = PiWorkerService::new(config(2, 1_000));

        service.shutdown().await.unwrap();

        let status = call(&service, 10).await.unwrap_err();
        assert_eq!(status.code(), Code::Unavailable);
    }
}
