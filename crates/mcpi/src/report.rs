//! The fixed-format run report.
//!
//! ```text
//! Finished in 1.2345 seconds using 4 workers
//! Total iterations: 100000000
//! Estimated Pi: 3.1415926536
//! ```
//!
//! The ` using N workers` suffix is only present for distributed runs.

use crate::{Error, PiEstimate, Result};
use core::{fmt, time::Duration};
use std::path::Path;

/// The terminal artifact of a successful run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunReport {
    /// Wall-clock time spent dispatching and aggregating.
    pub elapsed: Duration,
    pub total_iterations: u64,
    /// Number of workers for a distributed run, `None` for a sequential one.
    pub worker_count: Option<usize>,
    pub pi_estimate: PiEstimate,
}

impl RunReport {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Writes the report to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Output`] if the file cannot be written.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_string()).map_err(|e| Error::Output {
            reason: format!("cannot write report to {}: {e}", path.display()),
        })
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Finished in {:.4} seconds", self.elapsed_seconds())?;
        if let Some(workers) = self.worker_count {
            write!(f, " using {workers} workers")?;
        }
        writeln!(f)?;
        writeln!(f, "Total iterations: {}", self.total_iterations)?;
        writeln!(f, "Estimated Pi: {:.10}", self.pi_estimate)
    }
}
