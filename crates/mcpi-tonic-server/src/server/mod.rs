//! Server-side components of the `pi-worker` process.
//!
//! ## Submodules
//!
//! - [`config`] - CLI/env configuration and its validation.
//! - [`pool`] - Sampler threads and the round-robin pool that feeds them.
//! - [`service`] - The `PiWorker` gRPC service.
//! - [`telemetry`] - Log subscriber and optional OpenTelemetry export.
//!
//! [`serve_with_incoming`] wires these together behind a `tonic` server. The
//! binary calls it with a real listener; tests call it with an ephemeral one.

pub mod config;
pub mod pool;
pub mod service;
pub mod telemetry;

mod serve;
pub use serve::serve_with_incoming;
