//! Combining partial results into a single estimate.

use crate::{Error, PartialResult, Result};
use core::fmt;

/// An estimate of π, `4 * hits / trials`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct PiEstimate(f64);

impl PiEstimate {
    /// Computes the estimate from a hit count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DivisionByZero`] when `total_iterations` is zero.
    pub fn from_hits(hits: u64, total_iterations: u64) -> Result<Self> {
        if total_iterations == 0 {
            return Err(Error::DivisionByZero);
        }
        Ok(Self(4.0 * hits as f64 / total_iterations as f64))
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for PiEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Sums the hits of every partial result and converts them to an estimate.
///
/// Summation is plain integer addition, so the order in which workers
/// completed has no effect on the outcome.
///
/// # Errors
///
/// - [`Error::DivisionByZero`] if `total_iterations` is zero.
/// - [`Error::InvalidArgument`] if the chunks of `results` do not add up to
///   exactly `total_iterations`, which would bias the estimate.
pub fn aggregate(results: &[PartialResult], total_iterations: u64) -> Result<PiEstimate> {
    if total_iterations == 0 {
        return Err(Error::DivisionByZero);
    }

    let (covered, hits) = results.iter().fold((0_u128, 0_u128), |(c, h), r| {
        (c + r.chunk.size as u128, h + r.hits as u128)
    });

    if covered != total_iterations as u128 {
        return Err(Error::InvalidArgument {
            reason: format!(
                "results cover {covered} of {total_iterations} iterations"
            ),
        });
    }

    if hits > covered {
        return Err(Error::InvalidArgument {
            reason: format!("{hits} hits reported for {covered} iterations"),
        });
    }

    PiEstimate::from_hits(hits as u64, total_iterations)
}
