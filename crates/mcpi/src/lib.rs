#![doc = include_str!("../README.md")]

mod aggregate;
mod dispatch;
mod error;
mod input;
mod kernel;
mod partition;
mod report;
mod solver;

pub use crate::aggregate::*;
pub use crate::dispatch::*;
pub use crate::error::*;
pub use crate::input::*;
pub use crate::kernel::*;
pub use crate::partition::*;
pub use crate::report::*;
pub use crate::solver::*;
