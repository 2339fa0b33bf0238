//! Messages and bindings generated from `proto/mcpi.proto`.
//!
//! ## Service
//!
//! - `CalculatePiChunk` - runs `iterations` Monte Carlo trials on the worker
//!   and answers with the number of hits.
//!
//! ## Messages
//!
//! - [`ChunkRequest`] - `uint64 iterations = 1;`
//! - [`ChunkResponse`] - `uint64 hits = 1;`
//!
//! The generated modules are [`pi_worker_client`] (for the solver) and
//! [`pi_worker_server`] (for the worker process). [`FILE_DESCRIPTOR_SET`]
//! feeds the worker's reflection service.

tonic::include_proto!("mcpi");

/// Encoded descriptor set of `proto/mcpi.proto`, for gRPC server reflection.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("mcpi_descriptor");
