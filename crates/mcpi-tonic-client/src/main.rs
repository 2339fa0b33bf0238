#![doc = include_str!("../README.md")]

mod config;

use clap::Parser;
use config::{CliArgs, SolverConfig};
use mcpi_tonic_core::{
    client::RemoteWorker,
    mcpi::{DispatchOptions, RunReport, Solver},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let config = SolverConfig::try_from(CliArgs::parse())?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()?;

    let report = run(config).await?;
    print!("{report}");
    Ok(())
}

/// Builds the solver described by `config` and runs it once.
async fn run(config: SolverConfig) -> anyhow::Result<RunReport> {
    let report = match config {
        SolverConfig::Local {
            input,
            output,
            seed,
        } => {
            tracing::info!("Running locally");
            let mut solver = Solver::sequential(input, output);
            if let Some(seed) = seed {
                solver = solver.with_seed(seed);
            }
            solver.solve().await?
        }
        SolverConfig::Distributed {
            input,
            output,
            workers,
            call_timeout,
            connect_timeout,
            retries,
        } => {
            tracing::info!("Running across {} workers", workers.len());
            let workers = workers
                .into_iter()
                .map(|endpoint| RemoteWorker::connect_lazy(endpoint, Some(connect_timeout)))
                .collect::<Result<Vec<_>, _>>()?;

            let mut options = DispatchOptions::default();
            if let Some(timeout) = call_timeout {
                options = options.with_call_timeout(timeout);
            }

            Solver::distributed(workers, input, output)
                .with_dispatch_options(options)
                .with_retries(retries)
                .solve()
                .await?
        }
    };

    tracing::info!(
        "Estimated Pi {:.10} from {} trials",
        report.pi_estimate,
        report.total_iterations
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    #[tokio::test]
    async fn local_run_writes_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        let output = dir.path().join("output.txt");
        std::fs::write(&input, "40000\n").unwrap();

        let report = run(SolverConfig::Local {
            input,
            output: output.clone(),
            seed: Some(11),
        })
        .await
        .unwrap();

        assert_eq!(report.total_iterations, 40_000);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), report.to_string());
    }

    #[tokio::test]
    async fn malformed_endpoint_fails_before_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        std::fs::write(&input, "10").unwrap();

        let result = run(SolverConfig::Distributed {
            input,
            output: dir.path().join("output.txt"),
            workers: vec!["not a uri".into()],
            call_timeout: None,
            connect_timeout: Duration::from_secs(1),
            retries: 0,
        })
        .await;

        assert!(result.is_err());
        assert!(!dir.path().join("output.txt").exists());
    }
}
