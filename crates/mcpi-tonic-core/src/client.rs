//! gRPC implementation of [`WorkerHandle`].

use crate::{
    Error, Result,
    proto::{ChunkRequest, pi_worker_client::PiWorkerClient},
    worker_error_from_status,
};
use core::{fmt, future::Future, time::Duration};
use mcpi::{WorkerError, WorkerHandle};
use tonic::transport::{Channel, Endpoint};

/// A remote worker process reached over gRPC.
///
/// The underlying channel connects lazily: building a `RemoteWorker` never
/// touches the network, and an unreachable worker only shows up when a chunk
/// is dispatched to it, as a [`WorkerError::Transport`].
///
/// Cloning is cheap and shares the same HTTP/2 connection.
#[derive(Clone, Debug)]
pub struct RemoteWorker {
    endpoint: String,
    client: PiWorkerClient<Channel>,
}

impl RemoteWorker {
    /// Creates a handle for the worker listening at `endpoint`
    /// (e.g. `http://10.0.0.7:50051`).
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if `endpoint` is not a valid URI.
    pub fn connect_lazy(
        endpoint: impl Into<String>,
        connect_timeout: Option<Duration>,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        let mut builder =
            Endpoint::from_shared(endpoint.clone()).map_err(|e| Error::InvalidEndpoint {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self {
            client: PiWorkerClient::new(builder.connect_lazy()),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Display for RemoteWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.endpoint)
    }
}

impl WorkerHandle for RemoteWorker {
    fn invoke(
        &self,
        chunk_size: u64,
    ) -> impl Future<Output = core::result::Result<u64, WorkerError>> + Send {
        // Generated clients take `&mut self`; a clone shares the channel.
        let mut client = self.client.clone();
        async move {
            client
                .calculate_pi_chunk(ChunkRequest {
                    iterations: chunk_size,
                })
                .await
                .map(|response| response.into_inner().hits)
                .map_err(|status| worker_error_from_status(&status))
        }
    }
}
