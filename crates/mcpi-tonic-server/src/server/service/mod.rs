//! gRPC service implementation.
//!
//! - [`handler`] - gRPC service entry point (`PiWorkerService`).

pub mod handler;
