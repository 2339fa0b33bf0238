use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use core::time::Duration;
use std::path::PathBuf;

/// Command-line interface of the `pi-solver` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pi-solver",
    version,
    about = "Estimates Pi by Monte Carlo sampling, locally or across gRPC workers"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Mode {
    /// Run every trial in this process on a single thread.
    Local(LocalArgs),
    /// Split the trials across remote `pi-worker` processes.
    Distributed(DistributedArgs),
}

#[derive(Args, Debug, Clone)]
pub struct Files {
    /// File whose first line is the total number of trials.
    ///
    /// Environment variable: `MCPI_INPUT`
    #[arg(long, env = "MCPI_INPUT")]
    pub input: PathBuf,

    /// Where the three-line report is written.
    ///
    /// Environment variable: `MCPI_OUTPUT`
    #[arg(long, env = "MCPI_OUTPUT")]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct LocalArgs {
    #[command(flatten)]
    pub files: Files,

    /// Seed for the sampler. Omit to seed from OS entropy.
    ///
    /// Environment variable: `MCPI_SEED`
    #[arg(long, env = "MCPI_SEED")]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct DistributedArgs {
    #[command(flatten)]
    pub files: Files,

    /// Worker endpoint, e.g. `http://10.0.0.7:50051`. Repeat the flag (or
    /// comma-separate the env var) once per worker; order is significant.
    ///
    /// Environment variable: `MCPI_WORKERS`
    #[arg(
        long = "worker",
        env = "MCPI_WORKERS",
        value_delimiter = ',',
        required = true
    )]
    pub workers: Vec<String>,

    /// Per-call deadline in seconds. Unbounded when omitted.
    ///
    /// Environment variable: `MCPI_CALL_TIMEOUT_SECS`
    #[arg(long, env = "MCPI_CALL_TIMEOUT_SECS")]
    pub call_timeout_secs: Option<u64>,

    /// Deadline for establishing each worker connection, in seconds.
    ///
    /// Environment variable: `MCPI_CONNECT_TIMEOUT_SECS`
    #[arg(long, env = "MCPI_CONNECT_TIMEOUT_SECS", default_value_t = 5)]
    pub connect_timeout_secs: u64,

    /// How many times the whole dispatch is re-run after a worker failure.
    ///
    /// Environment variable: `MCPI_RETRIES`
    #[arg(long, env = "MCPI_RETRIES", default_value_t = 0)]
    pub retries: usize,
}

/// Validated configuration for one `pi-solver` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverConfig {
    Local {
        input: PathBuf,
        output: PathBuf,
        seed: Option<u64>,
    },
    Distributed {
        input: PathBuf,
        output: PathBuf,
        workers: Vec<String>,
        call_timeout: Option<Duration>,
        connect_timeout: Duration,
        retries: usize,
    },
}

impl TryFrom<CliArgs> for SolverConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        match args.mode {
            Mode::Local(LocalArgs { files, seed }) => Ok(Self::Local {
                input: files.input,
                output: files.output,
                seed,
            }),
            Mode::Distributed(args) => {
                let workers: Vec<String> = args
                    .workers
                    .into_iter()
                    .map(|w| w.trim().to_string())
                    .filter(|w| !w.is_empty())
                    .collect();

                if workers.is_empty() {
                    bail!("At least one --worker endpoint is required");
                }

                if args.call_timeout_secs == Some(0) {
                    bail!("--call-timeout-secs must be greater than 0");
                }

                if args.connect_timeout_secs == 0 {
                    bail!("--connect-timeout-secs must be greater than 0");
                }

                Ok(Self::Distributed {
                    input: args.files.input,
                    output: args.files.output,
                    workers,
                    call_timeout: args.call_timeout_secs.map(Duration::from_secs),
                    connect_timeout: Duration::from_secs(args.connect_timeout_secs),
                    retries: args.retries,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<SolverConfig> {
        let args =
            CliArgs::try_parse_from(core::iter::once("pi-solver").chain(args.iter().copied()))?;
        SolverConfig::try_from(args)
    }

    #[test]
    fn local_mode() {
        let config = parse(&["local", "--input", "in.txt", "--output", "out.txt", "--seed", "3"])
            .unwrap();

        assert_eq!(
            config,
            SolverConfig::Local {
                input: "in.txt".into(),
                output: "out.txt".into(),
                seed: Some(3),
            }
        );
    }

    #[test]
    fn distributed_mode_keeps_worker_order() {
        let config = parse(&[
            "distributed",
            "--input",
            "in.txt",
            "--output",
            "out.txt",
            "--worker",
            "http://b:50051",
            "--worker",
            "http://a:50051",
            "--call-timeout-secs",
            "30",
            "--retries",
            "2",
        ])
        .unwrap();

        assert_eq!(
            config,
            SolverConfig::Distributed {
                input: "in.txt".into(),
                output: "out.txt".into(),
                workers: vec!["http://b:50051".into(), "http://a:50051".into()],
                call_timeout: Some(Duration::from_secs(30)),
                connect_timeout: Duration::from_secs(5),
                retries: 2,
            }
        );
    }

    #[test]
    fn zero_call_timeout_is_rejected() {
        let err = parse(&[
            "distributed",
            "--input",
            "in.txt",
            "--output",
            "out.txt",
            "--worker",
            "http://a:50051",
            "--call-timeout-secs",
            "0",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("call-timeout"));
    }

    #[test]
    fn blank_worker_list_is_rejected() {
        assert!(
            parse(&[
                "distributed",
                "--input",
                "in.txt",
                "--output",
                "out.txt",
                "--worker",
                " ",
            ])
            .is_err()
        );
    }
}
