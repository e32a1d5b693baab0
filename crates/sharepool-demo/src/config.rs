use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use sharepool::{AvailableParallelism, PoolSize};

/// Runtime configuration for the `sharepool-demo` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first, if present).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sharepool-demo",
    version,
    about = "Share one lazily-built worker pool between many concurrent clients"
)]
pub struct CliArgs {
    /// Number of workers built when the pool goes from empty to active.
    ///
    /// `0` picks half of the logical CPUs (at least one).
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = 0)]
    pub num_workers: usize,

    /// Number of clients leasing the pool concurrently in each round.
    ///
    /// Environment variable: `NUM_CLIENTS`
    #[arg(long, env = "NUM_CLIENTS", default_value_t = 8)]
    pub num_clients: usize,

    /// Jobs each client submits per round, spread over the shared workers.
    ///
    /// Environment variable: `JOBS_PER_CLIENT`
    #[arg(long, env = "JOBS_PER_CLIENT", default_value_t = 32)]
    pub jobs_per_client: usize,

    /// Simulated duration of each job, in milliseconds.
    ///
    /// Environment variable: `JOB_MILLIS`
    #[arg(long, env = "JOB_MILLIS", default_value_t = 5)]
    pub job_millis: u64,

    /// Capacity of each worker's task queue.
    ///
    /// Environment variable: `QUEUE_CAPACITY`
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = 4)]
    pub queue_capacity: usize,

    /// Number of rounds. The pool is torn down and rebuilt between rounds.
    ///
    /// Environment variable: `ROUNDS`
    #[arg(long, env = "ROUNDS", default_value_t = 2)]
    pub rounds: usize,

    /// Workers added to the configured count after every round, to show the
    /// count being re-read on rebuild.
    ///
    /// Environment variable: `GROW_PER_ROUND`
    #[arg(long, env = "GROW_PER_ROUND", default_value_t = 0)]
    pub grow_per_round: usize,
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub num_workers: usize,
    pub num_clients: usize,
    pub jobs_per_client: usize,
    pub job_duration: Duration,
    pub queue_capacity: usize,
    pub rounds: usize,
    pub grow_per_round: usize,
}

impl TryFrom<CliArgs> for DemoConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.num_clients == 0 {
            bail!("NUM_CLIENTS must be greater than 0");
        }

        if args.jobs_per_client == 0 {
            bail!("JOBS_PER_CLIENT must be greater than 0");
        }

        if args.queue_capacity == 0 {
            bail!("QUEUE_CAPACITY must be greater than 0");
        }

        let num_workers = match args.num_workers {
            0 => AvailableParallelism.worker_count(),
            n => n,
        };

        Ok(Self {
            num_workers,
            num_clients: args.num_clients,
            jobs_per_client: args.jobs_per_client,
            job_duration: Duration::from_millis(args.job_millis),
            queue_capacity: args.queue_capacity,
            rounds: args.rounds,
            grow_per_round: args.grow_per_round,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<DemoConfig> {
        let argv = core::iter::once("sharepool-demo").chain(args.iter().copied());
        DemoConfig::try_from(CliArgs::try_parse_from(argv)?)
    }

    #[test]
    fn explicit_values_are_kept() {
        let config = parse(&[
            "--num-workers",
            "3",
            "--num-clients",
            "5",
            "--job-millis",
            "12",
            "--grow-per-round",
            "1",
        ])
        .unwrap();
        assert_eq!(config.num_workers, 3);
        assert_eq!(config.num_clients, 5);
        assert_eq!(config.job_duration, Duration::from_millis(12));
        assert_eq!(config.grow_per_round, 1);
    }

    #[test]
    fn zero_workers_means_available_parallelism() {
        let config = parse(&["--num-workers", "0"]).unwrap();
        assert_eq!(config.num_workers, AvailableParallelism.worker_count());
    }

    #[test]
    fn rejects_zero_clients_jobs_and_capacity() {
        for flag in ["--num-clients", "--jobs-per-client", "--queue-capacity"] {
            let err = parse(&[flag, "0"]).unwrap_err();
            assert!(err.to_string().contains("must be greater than 0"), "{flag}: {err}");
        }
    }
}
