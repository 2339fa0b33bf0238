use crate::server::service::handler::PiWorkerService;
use core::future::Future;
use futures::Stream;
use mcpi_tonic_core::proto::{FILE_DESCRIPTOR_SET, pi_worker_server::PiWorkerServer};
use tokio::io::{AsyncRead, AsyncWrite};
use tonic::transport::{Server, server::Connected};
use tonic_health::server::HealthReporter;
use tonic_reflection::server::Builder;

/// Serves `service`, the gRPC health service and server reflection on
/// `incoming` until `signal` resolves.
///
/// Once `signal` resolves the worker is taken out of rotation: its health
/// status flips to `NOT_SERVING`, new chunks are refused with `UNAVAILABLE`,
/// in-flight chunks are drained, and the sampler threads are stopped. Only
/// then does the server close its connections and return.
pub async fn serve_with_incoming<I, IO, IE, F>(
    service: PiWorkerService,
    incoming: I,
    signal: F,
) -> anyhow::Result<()>
where
    I: Stream<Item = Result<IO, IE>>,
    IO: AsyncRead + AsyncWrite + Connected + Unpin + Send + 'static,
    IE: Into<Box<dyn std::error::Error + Send + Sync>>,
    F: Future<Output = ()>,
{
    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<PiWorkerServer<PiWorkerService>>()
        .await;

    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    Server::builder()
        .http2_adaptive_window(Some(true))
        .add_service(health_service)
        .add_service(reflection)
        .add_service(PiWorkerServer::new(service.clone()))
        .serve_with_incoming_shutdown(incoming, drain(service, health_reporter, signal))
        .await?;

    #[cfg(feature = "tracing")]
    tracing::info!("Service shut down successfully");
    Ok(())
}

async fn drain<F>(service: PiWorkerService, health_reporter: HealthReporter, signal: F)
where
    F: Future<Output = ()>,
{
    signal.await;

    #[cfg(feature = "tracing")]
    tracing::info!("Shutdown signal received, terminating gracefully...");

    // 1. Publish the status
    health_reporter
        .set_not_serving::<PiWorkerServer<PiWorkerService>>()
        .await;

    // 2. Refuse, drain, and stop the sampler threads
    if let Err(_e) = service.shutdown().await {
        #[cfg(feature = "tracing")]
        tracing::error!("Error during service shutdown: {:?}", _e);
    }
}
