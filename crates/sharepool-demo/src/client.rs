use crate::config::DemoConfig;
use anyhow::bail;
use sharepool::{SharedWorkerCount, TokioWorkerFactory, WorkerPool};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The pool every client shares: Tokio workers, a runtime-adjustable count,
/// and owners keyed by client name.
pub type DemoPool = WorkerPool<TokioWorkerFactory, SharedWorkerCount, String>;

/// What one client observed during a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientReport {
    pub client_id: usize,
    pub workers: usize,
    pub jobs: usize,
    pub checksum: u64,
}

/// Leases the pool, spreads `jobs_per_client` jobs over the shared workers
/// (starting at a per-client offset), waits for all of them, and releases.
#[tracing::instrument(skip(pool, config))]
pub async fn run_client(
    client_id: usize,
    pool: Arc<DemoPool>,
    config: Arc<DemoConfig>,
) -> anyhow::Result<ClientReport> {
    let lease = pool.lease(format!("client-{client_id}"))?;
    if lease.is_empty() {
        bail!("Pool handed out an empty worker set");
    }

    let (result_tx, mut result_rx) = mpsc::channel(config.jobs_per_client);

    for job in 0..config.jobs_per_client {
        let worker = &lease[(client_id + job) % lease.len()];
        let result_tx = result_tx.clone();
        let duration = config.job_duration;

        worker
            .submit(async move {
                tokio::time::sleep(duration).await;
                let _ = result_tx.send(job_value(client_id, job)).await;
            })
            .await?;
    }
    drop(result_tx);

    let mut jobs = 0;
    let mut checksum = 0_u64;
    while let Some(value) = result_rx.recv().await {
        jobs += 1;
        checksum = checksum.wrapping_add(value);
    }

    if jobs != config.jobs_per_client {
        bail!(
            "Client {client_id} completed {jobs} of {} jobs",
            config.jobs_per_client
        );
    }

    tracing::debug!(workers = lease.len(), jobs, "Client finished");

    Ok(ClientReport {
        client_id,
        workers: lease.len(),
        jobs,
        checksum,
    })
}

/// Deterministic stand-in for real work.
pub fn job_value(client_id: usize, job: usize) -> u64 {
    let mut x = ((client_id as u64) << 32) ^ job as u64;
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x
}

/// The checksum a client must report if every job ran exactly once.
pub fn expected_checksum(client_id: usize, jobs: usize) -> u64 {
    (0..jobs).fold(0_u64, |acc, job| acc.wrapping_add(job_value(client_id, job)))
}
