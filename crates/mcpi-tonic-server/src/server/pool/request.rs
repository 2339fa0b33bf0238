use tokio::sync::oneshot;

/// A message for a single sampler thread.
#[derive(Debug)]
pub enum WorkRequest {
    /// Run `iterations` trials and send the hit count back.
    Sample {
        iterations: u64,
        response: oneshot::Sender<u64>,
    },
    /// Stop after acknowledging.
    Shutdown { response: oneshot::Sender<()> },
}
