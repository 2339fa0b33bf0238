#![doc = include_str!("../README.md")]

pub mod client;
mod common;
pub use common::*;
// Public re-export so downstream crates can access `mcpi` via
// `mcpi_tonic_core::mcpi`
pub use mcpi;
