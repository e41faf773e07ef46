//! Capacity-discovery controller.
//!
//! # Responsibilities
//! - Drive the configured strategy one batch at a time
//! - Calibrate thresholds from the first batch and freeze them
//! - Merge each batch into run totals (single writer) and the history
//! - Verify the ramp result with repeated batches
//! - Stop promptly on shutdown

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::batch::{BatchRunner, BatchStats, RunTotals};
use crate::config::{Strategy, TesterConfig};
use crate::discovery::ramp::{RampDecision, RampStrategy};
use crate::discovery::search::SearchStrategy;
use crate::discovery::state::{DiscoveryOutcome, Phase, Termination};
use crate::discovery::thresholds::{ThresholdCalibrator, Thresholds};
use crate::observability::{metrics, IterationReport, Reporter};
use crate::probe::Prober;

/// Runs one capacity-discovery session against a single target.
pub struct CapacityController<P, R> {
    runner: BatchRunner<P>,
    config: TesterConfig,
    reporter: R,
    shutdown: CancellationToken,
    calibrator: ThresholdCalibrator,
    totals: RunTotals,
    history: Vec<BatchStats>,
}

impl<P: Prober, R: Reporter> CapacityController<P, R> {
    pub fn new(
        runner: BatchRunner<P>,
        config: TesterConfig,
        reporter: R,
        shutdown: CancellationToken,
    ) -> Self {
        let calibrator = ThresholdCalibrator::new(config.thresholds.clone());
        Self {
            runner,
            config,
            reporter,
            shutdown,
            calibrator,
            totals: RunTotals::default(),
            history: Vec::new(),
        }
    }

    /// Convenience constructor wiring a runner from the probe configuration.
    pub fn from_config(
        prober: Arc<P>,
        target: url::Url,
        config: TesterConfig,
        reporter: R,
        shutdown: CancellationToken,
    ) -> Self {
        let runner = BatchRunner::from_config(prober, target, &config.probe);
        Self::new(runner, config, reporter, shutdown)
    }

    /// Run the configured strategy to completion and report the outcome.
    pub async fn run(mut self) -> (DiscoveryOutcome, R) {
        let strategy = self.config.discovery.strategy;
        tracing::info!(
            target = %self.runner.target(),
            strategy = %strategy,
            ceiling = self.config.discovery.ceiling,
            "Capacity discovery starting"
        );

        let (capacity, termination) = match strategy {
            Strategy::Ramp => self.run_ramp().await,
            Strategy::Search => self.run_search().await,
        };

        let outcome = DiscoveryOutcome {
            strategy,
            capacity,
            termination,
            thresholds: self.calibrator.current(),
            history: std::mem::take(&mut self.history),
            totals: self.totals.clone(),
        };

        tracing::info!(
            capacity = outcome.capacity,
            termination = %outcome.termination,
            batches = outcome.totals.batches,
            requests = outcome.totals.requests,
            "Capacity discovery finished"
        );
        self.reporter.finished(&outcome);
        (outcome, self.reporter)
    }

    async fn run_ramp(&mut self) -> (usize, Termination) {
        let mut strategy = RampStrategy::new(self.config.ramp.clone(), self.config.discovery.ceiling);

        let (capacity, termination) = loop {
            let concurrency = strategy.current();
            let phase = Phase::Ramp(strategy.phase());
            let Some((stats, thresholds)) = self.measure(concurrency).await else {
                let last_good = if self.history.is_empty() { 0 } else { strategy.last_good() };
                return (last_good, Termination::Cancelled);
            };

            let accepted = thresholds.is_satisfied_by(&stats);
            self.report(phase, &stats, &thresholds, accepted, None);

            match strategy.observe(&stats, &thresholds) {
                RampDecision::Continue(_) => continue,
                RampDecision::Finished {
                    capacity,
                    termination,
                } => break (capacity, termination),
            }
        };

        self.verify(capacity, termination).await
    }

    /// Re-test the ramp result; each failing batch lowers it by one.
    ///
    /// The lowered value is not re-tested.
    async fn verify(&mut self, capacity: usize, termination: Termination) -> (usize, Termination) {
        let attempts = self.config.ramp.verification_attempts;
        let tested = capacity;
        let mut capacity = capacity;

        for attempt in 1..=attempts {
            tracing::info!(attempt, concurrency = tested, "Verification batch");
            let Some((stats, thresholds)) = self.measure(tested).await else {
                return (capacity, Termination::Cancelled);
            };

            let accepted = thresholds.is_satisfied_by(&stats);
            self.report(Phase::Verification, &stats, &thresholds, accepted, None);

            if !accepted && capacity > 1 {
                capacity -= 1;
                tracing::warn!(
                    attempt,
                    capacity,
                    "Degradation during verification, lowering result"
                );
            }
        }

        (capacity, termination)
    }

    async fn run_search(&mut self) -> (usize, Termination) {
        let mut strategy =
            SearchStrategy::new(self.config.search.clone(), self.config.discovery.ceiling);

        while let Some(concurrency) = strategy.next_concurrency() {
            let phase = Phase::Search(strategy.phase());
            let Some((stats, thresholds)) = self.measure(concurrency).await else {
                return (strategy.result(), Termination::Cancelled);
            };

            let accepted = strategy.accepts(&stats, &thresholds);
            let score = thresholds.score(&stats);
            self.report(phase, &stats, &thresholds, accepted, Some(score));

            strategy.observe(concurrency, &stats, &thresholds);
        }

        let termination = strategy
            .termination()
            .unwrap_or(Termination::FailureBoundary);
        (strategy.result(), termination)
    }

    /// Run one batch and fold it into the run. `None` on shutdown.
    async fn measure(&mut self, concurrency: usize) -> Option<(BatchStats, Thresholds)> {
        if !self.history.is_empty() {
            self.pause(self.config.discovery.pause()).await?;
        }
        if self.shutdown.is_cancelled() {
            return None;
        }

        let stats = self.runner.run(concurrency, &self.shutdown).await;
        if self.shutdown.is_cancelled() {
            tracing::info!(concurrency, "Batch interrupted by shutdown, discarding");
            return None;
        }

        let thresholds = self.calibrator.thresholds_for(&stats);
        self.totals.merge(&stats);
        self.history.push(stats.clone());
        Some((stats, thresholds))
    }

    async fn pause(&self, duration: Duration) -> Option<()> {
        if duration.is_zero() {
            return Some(());
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => Some(()),
            _ = self.shutdown.cancelled() => None,
        }
    }

    fn report(
        &mut self,
        phase: Phase,
        stats: &BatchStats,
        thresholds: &Thresholds,
        accepted: bool,
        score: Option<f64>,
    ) {
        metrics::record_batch(stats, accepted);
        tracing::debug!(
            phase = %phase,
            concurrency = stats.concurrency,
            accepted,
            "Batch evaluated"
        );
        self.reporter.iteration(&IterationReport {
            phase,
            stats,
            thresholds,
            accepted,
            score,
        });
    }
}
