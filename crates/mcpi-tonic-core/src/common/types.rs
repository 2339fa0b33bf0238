//! Shared types and defaults for the worker and solver binaries.

use mcpi::Sampler;

/// The kernel owned by each sampler thread of a worker process.
pub type Generator = Sampler;

/// Default listen address of a worker process.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:50051";

/// Default upper bound on the trials a worker accepts in a single request.
pub const DEFAULT_MAX_ALLOWED_ITERATIONS: u64 = 10_000_000_000;
