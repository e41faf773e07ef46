//! Batch aggregation and run-wide totals.

use std::time::Duration;

use crate::probe::{FailureKind, ProbeResult};

/// Aggregated outcome of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStats {
    /// Probes requested; always >= 1.
    pub concurrency: usize,
    pub success_count: usize,
    /// Probes that completed with a failure.
    pub failure_count: usize,
    /// Probes cancelled before completing.
    pub abandoned_count: usize,
    /// Mean latency over successful probes; `None` when none succeeded.
    pub average_latency: Option<Duration>,
    /// (failures + abandoned) / concurrency, in [0, 1].
    pub error_rate: f64,
    /// Completed probes per second of batch wall time.
    pub requests_per_second: f64,
    pub elapsed: Duration,
}

impl BatchStats {
    /// Aggregate a finished set of results.
    ///
    /// Results short of `concurrency` are counted as abandoned.
    pub fn from_results(concurrency: usize, results: &[ProbeResult], elapsed: Duration) -> Self {
        let mut acc = BatchAccumulator::new(concurrency);
        for result in results {
            acc.record(*result);
        }
        acc.finish(elapsed)
    }

    /// successCount / concurrency.
    pub fn success_rate(&self) -> f64 {
        self.success_count as f64 / self.concurrency as f64
    }

    pub fn completed(&self) -> usize {
        self.success_count + self.failure_count
    }
}

/// Per-batch accumulator owned by the batch runner.
#[derive(Debug)]
pub struct BatchAccumulator {
    concurrency: usize,
    success_count: usize,
    failure_count: usize,
    abandoned_count: usize,
    latency_sum: Duration,
}

impl BatchAccumulator {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            success_count: 0,
            failure_count: 0,
            abandoned_count: 0,
            latency_sum: Duration::ZERO,
        }
    }

    pub fn record(&mut self, result: ProbeResult) {
        match result {
            ProbeResult::Success { latency } => {
                self.success_count += 1;
                self.latency_sum += latency;
            }
            ProbeResult::Failure(FailureKind::Abandoned) => self.abandoned_count += 1,
            ProbeResult::Failure(_) => self.failure_count += 1,
        }
    }

    pub fn record_abandoned(&mut self, count: usize) {
        self.abandoned_count += count;
    }

    pub fn finish(self, elapsed: Duration) -> BatchStats {
        let recorded = self.success_count + self.failure_count + self.abandoned_count;
        let abandoned_count = self.abandoned_count + self.concurrency.saturating_sub(recorded);

        let average_latency = if self.success_count > 0 {
            Some(self.latency_sum / self.success_count as u32)
        } else {
            None
        };

        let failed = (self.failure_count + abandoned_count).min(self.concurrency);
        let error_rate = failed as f64 / self.concurrency as f64;

        let completed = (self.success_count + self.failure_count) as f64;
        let requests_per_second = if elapsed > Duration::ZERO {
            completed / elapsed.as_secs_f64()
        } else {
            0.0
        };

        BatchStats {
            concurrency: self.concurrency,
            success_count: self.success_count,
            failure_count: self.failure_count,
            abandoned_count,
            average_latency,
            error_rate,
            requests_per_second,
            elapsed,
        }
    }
}

/// Cumulative counters across every batch of a run.
///
/// Only the controller writes these, after each batch has joined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub batches: usize,
    pub requests: usize,
    pub successes: usize,
    pub failures: usize,
    pub abandoned: usize,
}

impl RunTotals {
    pub fn merge(&mut self, stats: &BatchStats) {
        self.batches += 1;
        self.requests += stats.concurrency;
        self.successes += stats.success_count;
        self.failures += stats.failure_count;
        self.abandoned += stats.abandoned_count;
    }

    /// Cumulative error rate across the run.
    pub fn error_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            (self.failures + self.abandoned) as f64 / self.requests as f64
        }
    }
}
