//! Sampler threads and the pool that feeds them.
//!
//! - [`manager`] - [`manager::WorkerPool`]: round-robin dispatch, in-flight
//!   tracking, and staged shutdown.
//! - [`worker`] - The blocking loop each sampler thread runs.
//! - [`request`] - Messages sent from the pool to a thread.

pub mod manager;
pub mod request;
pub mod worker;
