//! Bounded-concurrency batch execution.
//!
//! # Responsibilities
//! - Fan out N probes while keeping at most `pool_cap` in flight
//! - Enforce the batch deadline
//! - Cancel (abort) probes still pending at the deadline or on shutdown
//! - Aggregate results into [`BatchStats`]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::batch::stats::{BatchAccumulator, BatchStats};
use crate::config::ProbeConfig;
use crate::probe::{FailureKind, ProbeResult, Prober};

/// Runs batches of probes against a single target.
pub struct BatchRunner<P> {
    prober: Arc<P>,
    target: Url,
    pool_cap: usize,
    deadline: Duration,
}

impl<P: Prober> BatchRunner<P> {
    pub fn new(prober: Arc<P>, target: Url, pool_cap: usize, deadline: Duration) -> Self {
        Self {
            prober,
            target,
            pool_cap: pool_cap.max(1),
            deadline,
        }
    }

    /// Runner with pool cap and deadline (2 × request timeout) from config.
    pub fn from_config(prober: Arc<P>, target: Url, config: &ProbeConfig) -> Self {
        Self::new(prober, target, config.pool_cap, config.batch_deadline())
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Run `concurrency` probes and wait for all of them, the deadline, or
    /// `shutdown`, whichever comes first.
    pub async fn run(&self, concurrency: usize, shutdown: &CancellationToken) -> BatchStats {
        let concurrency = concurrency.max(1);
        let pool = Arc::new(Semaphore::new(concurrency.min(self.pool_cap)));
        let started = Instant::now();

        let mut tasks = JoinSet::new();
        for _ in 0..concurrency {
            let prober = self.prober.clone();
            let target = self.target.clone();
            let pool = pool.clone();
            tasks.spawn(async move {
                let Ok(_permit) = pool.acquire_owned().await else {
                    return ProbeResult::Failure(FailureKind::Abandoned);
                };
                prober.probe(&target).await
            });
        }

        let mut acc = BatchAccumulator::new(concurrency);
        let deadline = tokio::time::sleep_until(started + self.deadline);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    Some(Ok(result)) => acc.record(result),
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Probe task failed");
                        acc.record(ProbeResult::Failure(FailureKind::Panicked));
                    }
                    None => break,
                },
                _ = &mut deadline => {
                    let pending = tasks.len();
                    tracing::warn!(
                        concurrency,
                        pending,
                        deadline = ?self.deadline,
                        "Batch deadline reached, cancelling outstanding probes"
                    );
                    tasks.shutdown().await;
                    acc.record_abandoned(pending);
                    break;
                }
                _ = shutdown.cancelled() => {
                    let pending = tasks.len();
                    tracing::info!(concurrency, pending, "Shutdown requested, cancelling batch");
                    tasks.shutdown().await;
                    acc.record_abandoned(pending);
                    break;
                }
            }
        }

        let stats = acc.finish(started.elapsed());
        tracing::debug!(
            concurrency,
            successes = stats.success_count,
            failures = stats.failure_count,
            abandoned = stats.abandoned_count,
            "Batch complete"
        );
        stats
    }
}
