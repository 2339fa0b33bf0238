use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use mcpi_tonic_core::{
    mcpi::stream_seed,
    types::{DEFAULT_MAX_ALLOWED_ITERATIONS, DEFAULT_SERVER_ADDR},
};

/// Runtime configuration for the `pi-worker` binary.
///
/// All values are parsed from CLI arguments or environment variables (a `.env`
/// file in the working directory is loaded first).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pi-worker",
    version,
    about = "A gRPC worker that runs chunks of Monte Carlo Pi trials"
)]
pub struct CliArgs {
    /// Largest chunk a single request may ask for.
    ///
    /// Requests above this are rejected with `INVALID_ARGUMENT` before any
    /// sampling starts.
    ///
    /// Environment variable: `MAX_ALLOWED_ITERATIONS`
    #[arg(long, env = "MAX_ALLOWED_ITERATIONS", default_value_t = DEFAULT_MAX_ALLOWED_ITERATIONS)]
    pub max_allowed_iterations: u64,

    /// Number of sampler threads. Each thread owns its own generator and runs
    /// one chunk at a time. Defaults to the number of logical CPUs.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS")]
    pub num_workers: Option<usize>,

    /// Base seed for the sampler threads. Thread `i` draws stream `i` of this
    /// seed. When omitted every thread is seeded from OS entropy.
    ///
    /// Environment variable: `SEED`
    #[arg(long, env = "SEED")]
    pub seed: Option<u64>,

    /// Seconds to wait for in-flight chunks to finish on shutdown.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,

    /// Address to listen on (TCP or Unix socket path; use --uds for Unix socket).
    ///
    /// Example: "0.0.0.0:50051" or "/tmp/pi-worker.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from(DEFAULT_SERVER_ADDR))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR` must be a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_allowed_iterations: u64,
    pub num_workers: usize,
    pub seed: Option<u64>,
    pub shutdown_timeout: Duration,
    pub server_addr: String,
    pub uds: bool,
}

impl ServerConfig {
    /// Seed for sampler thread `worker_id`, if the pool is seeded. Thread `i`
    /// runs stream `i` of the configured seed.
    pub fn seed_for(&self, worker_id: usize) -> Option<u64> {
        self.seed.map(|seed| stream_seed(seed, worker_id as u64))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_allowed_iterations: DEFAULT_MAX_ALLOWED_ITERATIONS,
            num_workers: num_cpus::get(),
            seed: None,
            shutdown_timeout: Duration::from_secs(3),
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            uds: false,
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let num_workers = args.num_workers.unwrap_or_else(num_cpus::get);

        if num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }

        if args.max_allowed_iterations == 0 {
            bail!("MAX_ALLOWED_ITERATIONS must be greater than 0");
        }

        if args.uds && args.server_addr.is_empty() {
            bail!("SERVER_ADDR must be a socket path when --uds is set");
        }

        Ok(Self {
            max_allowed_iterations: args.max_allowed_iterations,
            num_workers,
            seed: args.seed,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            server_addr: args.server_addr,
            uds: args.uds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ServerConfig> {
        let args = CliArgs::try_parse_from(core::iter::once("pi-worker").chain(args.iter().copied()))?;
        ServerConfig::try_from(args)
    }

    #[test]
    fn explicit_flags_are_applied() {
        let config = parse(&[
            "--num-workers",
            "4",
            "--seed",
            "7",
            "--max-allowed-iterations",
            "1000",
            "--shutdown-timeout",
            "10",
            "--server-addr",
            "127.0.0.1:6000",
        ])
        .unwrap();

        assert_eq!(config.num_workers, 4);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_allowed_iterations, 1000);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
        assert_eq!(config.server_addr, "127.0.0.1:6000");
        assert!(!config.uds);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = parse(&["--num-workers", "0"]).unwrap_err();
        assert!(err.to_string().contains("NUM_WORKERS"));
    }

    #[test]
    fn zero_iteration_cap_is_rejected() {
        assert!(parse(&["--num-workers", "1", "--max-allowed-iterations", "0"]).is_err());
    }

    #[test]
    fn thread_seeds_follow_the_streams_of_the_seed() {
        let config = ServerConfig {
            seed: Some(u64::MAX),
            ..ServerConfig::default()
        };
        assert_eq!(config.seed_for(0), Some(stream_seed(u64::MAX, 0)));
        assert_eq!(config.seed_for(1), Some(stream_seed(u64::MAX, 1)));

        assert_eq!(ServerConfig::default().seed_for(3), None);
    }

    #[test]
    fn workers_with_adjacent_seeds_use_unrelated_threads() {
        let with_seed = |seed| ServerConfig {
            num_workers: 4,
            seed: Some(seed),
            ..ServerConfig::default()
        };
        let (one, two) = (with_seed(1), with_seed(2));

        for i in 0..3 {
            assert_ne!(one.seed_for(i + 1), two.seed_for(i));
        }
        assert_ne!(one.seed_for(0), one.seed_for(1));
    }
}
