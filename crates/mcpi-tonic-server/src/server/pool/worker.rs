use crate::server::pool::request::WorkRequest;
use mcpi_tonic_core::types::Generator;
use tokio::sync::mpsc;

/// Loop run by each sampler thread.
///
/// Each thread owns its own [`Generator`], so no random state is ever shared
/// between threads. Sampling is CPU bound and runs synchronously; the loop is
/// meant to be started with [`tokio::task::spawn_blocking`].
///
/// The loop ends on [`WorkRequest::Shutdown`] or when every sender has been
/// dropped.
pub fn worker_loop(
    _worker_id: usize,
    mut rx: mpsc::Receiver<WorkRequest>,
    mut generator: Generator,
) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} started");

    while let Some(work) = rx.blocking_recv() {
        match work {
            WorkRequest::Sample {
                iterations,
                response,
            } => {
                let hits = generator.sample(iterations);
                if response.send(hits).is_err() {
                    // The caller gave up (shutdown or client cancellation).
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Worker {_worker_id} result for {iterations} trials dropped");
                }
            }
            WorkRequest::Shutdown { response } => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {_worker_id} received shutdown signal");

                if response.send(()).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker {_worker_id} failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} stopped");
}
