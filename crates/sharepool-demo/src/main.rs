#![doc = include_str!("../README.md")]

mod client;
mod config;
mod telemetry;

use clap::Parser;
use client::{DemoPool, expected_checksum, run_client};
use config::{CliArgs, DemoConfig};
use sharepool::{SharedWorkerCount, TokioWorkerFactory, WorkerPool};
use std::sync::Arc;
use telemetry::init_telemetry;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = Arc::new(DemoConfig::try_from(args)?);

    init_telemetry()?;
    log_startup_info(&config);

    let pool = Arc::new(WorkerPool::new(
        TokioWorkerFactory::current(config.queue_capacity),
        SharedWorkerCount::new(config.num_workers),
    ));

    tokio::select! {
        res = run_rounds(&pool, &config) => res?,
        () = shutdown_signal() => {
            tracing::info!("Stopping early, outstanding leases are released as clients drop");
        }
    }

    tracing::info!(status = ?pool.status(), "Demo finished");
    Ok(())
}

async fn run_rounds(
    pool: &Arc<DemoPool>,
    config: &Arc<DemoConfig>,
) -> anyhow::Result<()> {
    let count = pool.size_source();
    for round in 0..config.rounds {
        let clients = (0..config.num_clients).map(|client_id| {
            tokio::spawn(run_client(client_id, Arc::clone(pool), Arc::clone(config)))
        });

        let mut jobs = 0;
        for result in futures::future::join_all(clients).await {
            let report = result??;
            if report.checksum != expected_checksum(report.client_id, report.jobs) {
                anyhow::bail!("Client {} reported a bad checksum", report.client_id);
            }
            jobs += report.jobs;
        }

        tracing::info!(
            round,
            jobs,
            workers = count.get(),
            status = ?pool.status(),
            "Round complete"
        );

        if config.grow_per_round > 0 {
            count.set(count.get() + config.grow_per_round);
        }
    }

    Ok(())
}

fn log_startup_info(config: &DemoConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting demo with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting demo: {} clients sharing {} workers",
            config.num_clients,
            config.num_workers
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }
}
