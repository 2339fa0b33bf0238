//! Error types for the worker service and its clients.
//!
//! This module defines the central `Error` enum for the gRPC layer. It
//! implements `From<Error>` for `tonic::Status` so the worker can surface
//! failures to the solver with appropriate status codes, and
//! [`worker_error_from_status`] for the reverse direction on the solver side.
//!
//! ## Error Cases
//! - `ChannelError`: An internal communication failure between the service and
//!   its sampler threads.
//! - `InvalidRequest`: The request was malformed or exceeded bounds.
//! - `ServiceShutdown`: A request arrived while the worker was shutting down.
//! - `InvalidEndpoint`: A worker address could not be turned into a gRPC
//!   endpoint.

use mcpi::WorkerError;
use tonic::{Code, Status};

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the gRPC worker layer.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Internal channel send/receive failure (e.g., closed or full channel).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The request was invalid or exceeded constraints.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The worker is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,

    /// The worker address is not a valid URI.
    #[error("Invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {}", context))
            }
            Error::InvalidRequest { reason } => Status::invalid_argument(reason),
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
            Error::InvalidEndpoint { endpoint, reason } => {
                Status::invalid_argument(format!("Invalid endpoint {endpoint}: {reason}"))
            }
        }
    }
}

/// Classifies a failed call as seen by the solver.
///
/// `UNAVAILABLE` and `CANCELLED` mean the worker could not be reached or the
/// connection dropped, so they map to [`WorkerError::Transport`]. Every other
/// status was produced by a live worker and maps to [`WorkerError::Remote`].
pub fn worker_error_from_status(status: &Status) -> WorkerError {
    match status.code() {
        Code::Unavailable | Code::Cancelled => WorkerError::Transport {
            context: status.message().to_string(),
        },
        code => WorkerError::Remote {
            message: format!("{code:?}: {}", status.message()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_status_codes() {
        let cases = [
            (
                Error::ChannelError {
                    context: "closed".into(),
                },
                Code::Internal,
            ),
            (
                Error::InvalidRequest {
                    reason: "too big".into(),
                },
                Code::InvalidArgument,
            ),
            (Error::ServiceShutdown, Code::Unavailable),
        ];

        for (err, code) in cases {
            assert_eq!(Status::from(err).code(), code);
        }
    }

    #[test]
    fn invalid_request_keeps_its_reason() {
        let status = Status::from(Error::InvalidRequest {
            reason: "Iterations 5 exceed maximum allowed (4)".into(),
        });
        assert_eq!(status.message(), "Iterations 5 exceed maximum allowed (4)");
    }

    #[test]
    fn unreachable_worker_is_a_transport_error() {
        let err = worker_error_from_status(&Status::unavailable("tcp connect error"));
        assert_eq!(
            err,
            WorkerError::Transport {
                context: "tcp connect error".into()
            }
        );
    }

    #[test]
    fn shutting_down_worker_is_a_transport_error() {
        let status = Status::from(Error::ServiceShutdown);
        assert!(matches!(
            worker_error_from_status(&status),
            WorkerError::Transport { .. }
        ));
    }

    #[test]
    fn rejected_request_is_a_remote_error() {
        let err = worker_error_from_status(&Status::invalid_argument("too big"));
        assert_eq!(
            err,
            WorkerError::Remote {
                message: "InvalidArgument: too big".into()
            }
        );
    }
}
