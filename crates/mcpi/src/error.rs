//! Error types for a Monte Carlo Pi run.
//!
//! Every error is fatal to the run that produced it: there is no partial
//! aggregation and no degraded-precision fallback. When a run fails, no report
//! is written.
//!
//! ## Error Cases
//! - `Input`: the iteration count could not be read or parsed.
//! - `InvalidArgument`: the run was configured with an unusable worker set or
//!   produced results that do not cover the requested total.
//! - `WorkerFailure`: a worker invocation failed; see [`WorkerError`].
//! - `DivisionByZero`: zero iterations were requested, so the estimate is
//!   undefined.
//! - `Output`: the report could not be written.
//! - `InvalidState`: a solver was asked to run more than once.

use crate::solver::SolverState;
use core::time::Duration;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for a solver run.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The input source is missing, unreadable, or does not hold a
    /// non-negative integer on its first line.
    #[error("Input error: {reason}")]
    Input { reason: String },

    /// The run was configured with arguments that cannot produce a valid
    /// estimate (for example zero workers).
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// A single worker invocation failed, invalidating the whole run.
    #[error("Worker {worker_index} failed: {cause}")]
    WorkerFailure {
        worker_index: usize,
        cause: WorkerError,
    },

    /// `total_iterations == 0`; the estimate `4 * hits / total` is undefined.
    #[error("Estimate undefined: total iterations is zero")]
    DivisionByZero,

    /// The report could not be written to its sink.
    #[error("Output error: {reason}")]
    Output { reason: String },

    /// `solve` was called on a solver that already left [`SolverState::Idle`].
    #[error("Solver cannot run from state {state:?}")]
    InvalidState { state: SolverState },
}

/// Reason a single worker invocation failed.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum WorkerError {
    /// The worker could not be reached (connection refused, reset, DNS, ...).
    #[error("transport error: {context}")]
    Transport { context: String },

    /// The worker was reached but answered with an error.
    #[error("remote error: {message}")]
    Remote { message: String },

    /// The worker answered with more hits than trials it was asked to run.
    #[error("response out of range: {hits} hits for a chunk of {chunk_size}")]
    OutOfRange { hits: u64, chunk_size: u64 },

    /// The worker did not answer within the per-call deadline.
    #[error("no response within {after:?}")]
    Timeout { after: Duration },
}
