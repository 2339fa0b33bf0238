//! End-to-end orchestration of a run.
//!
//! A [`Solver`] reads the iteration count, plans the chunks, dispatches them,
//! aggregates the partial results, and writes the report. It moves through
//! [`SolverState`] strictly forward and runs at most once.
//!
//! Only dispatch and aggregation are timed. Reading the input and writing the
//! report are excluded so the reported time reflects computational cost.

use crate::{
    Chunk, DispatchOptions, Error, LocalWorker, PartialResult, Result, RunReport, WorkerHandle,
    aggregate, dispatch, input::read_iterations, kernel::Sampler, partition,
};
use std::{
    path::{Path, PathBuf},
    time::Instant,
};

/// Lifecycle of a [`Solver`]. States are ordered; a solver never moves
/// backwards and never re-enters a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SolverState {
    Idle,
    ReadingInput,
    Dispatching,
    Aggregating,
    WritingReport,
    Done,
    Failed,
}

impl SolverState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

enum Mode<H> {
    /// One chunk covering the whole total, sampled on the calling thread.
    Sequential { seed: Option<u64> },
    /// One chunk per worker, dispatched concurrently.
    Distributed { workers: Vec<H> },
}

/// Runs one Monte Carlo Pi estimation from an input file to a report file.
pub struct Solver<H = LocalWorker> {
    input: PathBuf,
    output: PathBuf,
    mode: Mode<H>,
    options: DispatchOptions,
    retries: usize,
    state: SolverState,
}

impl Solver<LocalWorker> {
    /// A single-process solver: no partitioning, no concurrency.
    pub fn sequential(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self::with_mode(Mode::Sequential { seed: None }, input, output)
    }

    /// Fixes the seed of the sequential sampler. Distributed runs draw their
    /// randomness on the workers and are unaffected.
    pub fn with_seed(mut self, seed: u64) -> Self {
        if let Mode::Sequential { seed: s } = &mut self.mode {
            *s = Some(seed);
        }
        self
    }
}

impl<H> Solver<H>
where
    H: WorkerHandle,
{
    /// A solver that splits the work across `workers`, in order.
    ///
    /// An empty worker set is accepted here but rejected by [`Solver::solve`]
    /// with [`Error::InvalidArgument`] before anything is dispatched.
    pub fn distributed(
        workers: Vec<H>,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self::with_mode(Mode::Distributed { workers }, input, output)
    }

    fn with_mode(mode: Mode<H>, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        #[cfg(feature = "tracing")]
        tracing::debug!("Initialized");

        Self {
            input: input.into(),
            output: output.into(),
            mode,
            options: DispatchOptions::default(),
            retries: 0,
            state: SolverState::Idle,
        }
    }

    pub const fn with_dispatch_options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Re-runs the whole dispatch up to `retries` more times after a
    /// [`Error::WorkerFailure`]. Every chunk is dispatched again; no partial
    /// result from a failed attempt is kept.
    pub const fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub const fn state(&self) -> SolverState {
        self.state
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Number of workers for a distributed solver, `None` for a sequential
    /// one.
    pub fn worker_count(&self) -> Option<usize> {
        match &self.mode {
            Mode::Sequential { .. } => None,
            Mode::Distributed { workers } => Some(workers.len()),
        }
    }

    /// The chunks this solver would dispatch for `total` iterations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a distributed solver without
    /// workers.
    pub fn plan(&self, total: u64) -> Result<Vec<Chunk>> {
        match &self.mode {
            Mode::Sequential { .. } => Ok(vec![Chunk {
                worker_index: 0,
                size: total,
            }]),
            Mode::Distributed { workers } => partition(total, workers.len()),
        }
    }

    /// Executes the run and writes the report.
    ///
    /// On success the report has been written to the output path and is also
    /// returned. On failure nothing is written and the solver ends in
    /// [`SolverState::Failed`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if this solver already ran.
    /// - [`Error::Input`] if the iteration count cannot be read.
    /// - [`Error::InvalidArgument`] if there are no workers.
    /// - [`Error::WorkerFailure`] if any worker call failed (after retries).
    /// - [`Error::DivisionByZero`] if zero iterations were requested.
    /// - [`Error::Output`] if the report cannot be written.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(input = %self.input.display())))]
    pub async fn solve(&mut self) -> Result<RunReport> {
        if self.state != SolverState::Idle {
            return Err(Error::InvalidState { state: self.state });
        }

        match self.run().await {
            Ok(report) => Ok(report),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Run failed in state {:?}: {}", self.state, err);

                self.advance(SolverState::Failed);
                Err(err)
            }
        }
    }

    async fn run(&mut self) -> Result<RunReport> {
        #[cfg(feature = "tracing")]
        tracing::info!("Job started");

        self.advance(SolverState::ReadingInput);
        let total = read_iterations(&self.input)?;
        let chunks = self.plan(total)?;

        #[cfg(feature = "tracing")]
        {
            if let Some(workers) = self.worker_count() {
                tracing::info!("Workers: {workers}");
            }
        }

        self.advance(SolverState::Dispatching);
        let start = Instant::now();
        let results = self.execute(&chunks).await?;

        self.advance(SolverState::Aggregating);
        let pi_estimate = aggregate(&results, total)?;
        let elapsed = start.elapsed();

        let report = RunReport {
            elapsed,
            total_iterations: total,
            worker_count: self.worker_count(),
            pi_estimate,
        };

        #[cfg(feature = "tracing")]
        tracing::info!("Finished in {:.4} seconds", report.elapsed_seconds());

        self.advance(SolverState::WritingReport);
        report.write_to(&self.output)?;

        self.advance(SolverState::Done);
        Ok(report)
    }

    async fn execute(&self, chunks: &[Chunk]) -> Result<Vec<PartialResult>> {
        match &self.mode {
            Mode::Sequential { seed } => {
                let mut sampler = match seed {
                    Some(seed) => Sampler::stream(*seed, 0),
                    None => Sampler::from_entropy(),
                };
                Ok(chunks
                    .iter()
                    .map(|&chunk| PartialResult {
                        chunk,
                        hits: sampler.sample(chunk.size),
                    })
                    .collect())
            }
            Mode::Distributed { workers } => {
                let mut attempt = 0;
                loop {
                    match dispatch(workers, chunks, &self.options).await {
                        Err(_e @ Error::WorkerFailure { .. }) if attempt < self.retries => {
                            attempt += 1;
                            #[cfg(feature = "tracing")]
                            tracing::warn!(
                                "Retrying dispatch ({attempt}/{}) after: {_e}",
                                self.retries
                            );
                        }
                        outcome => return outcome,
                    }
                }
            }
        }
    }

    fn advance(&mut self, next: SolverState) {
        debug_assert!(
            next > self.state && !self.state.is_terminal(),
            "illegal transition {:?} -> {next:?}",
            self.state
        );

        #[cfg(feature = "tracing")]
        tracing::trace!("{:?} -> {:?}", self.state, next);

        self.state = next;
    }
}
