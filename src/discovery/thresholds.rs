//! Acceptance thresholds.
//!
//! Thresholds are calibrated once, from the first batch of a run, and never
//! recomputed. An unusually slow or fast first batch therefore skews every
//! later accept/reject decision of that run.

use std::time::Duration;

use crate::batch::BatchStats;
use crate::config::{LatencyMode, ThresholdConfig};

/// Comfort margins used by the ramp strategy to speed up.
const COMFORT_LATENCY_RATIO: f64 = 0.7;
const COMFORT_ERROR_RATIO: f64 = 0.5;

// Rounded to the nearest nanosecond so exact inputs stay exact.
fn scale(duration: Duration, factor: f64) -> Duration {
    Duration::from_nanos((duration.as_nanos() as f64 * factor).round() as u64)
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::from_nanos((secs * 1e9).round() as u64)
}

/// Frozen acceptance ceilings for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub max_error_rate: f64,
    pub max_avg_latency: Duration,
}

impl Thresholds {
    /// Derive thresholds from the first batch of a run.
    pub fn calibrate(first: &BatchStats, config: &ThresholdConfig) -> Self {
        let max_avg_latency = match config.latency_mode {
            LatencyMode::Static => secs_to_duration(config.static_latency_secs),
            LatencyMode::Dynamic => match first.average_latency {
                Some(avg) => scale(avg, config.dynamic_multiplier),
                None => {
                    tracing::warn!(
                        concurrency = first.concurrency,
                        fallback_secs = config.dynamic_fallback_secs,
                        "First batch had no successful probe, using fallback latency threshold"
                    );
                    secs_to_duration(config.dynamic_fallback_secs)
                }
            },
        };

        let thresholds = Self {
            max_error_rate: config.max_error_rate,
            max_avg_latency,
        };
        tracing::info!(
            max_error_rate = thresholds.max_error_rate,
            max_avg_latency = ?thresholds.max_avg_latency,
            mode = ?config.latency_mode,
            "Thresholds calibrated"
        );
        thresholds
    }

    /// Latency within bounds. A batch without a latency sample never is.
    pub fn latency_ok(&self, stats: &BatchStats) -> bool {
        stats
            .average_latency
            .is_some_and(|avg| avg <= self.max_avg_latency)
    }

    /// Error rate and latency both within bounds.
    pub fn is_satisfied_by(&self, stats: &BatchStats) -> bool {
        stats.error_rate <= self.max_error_rate && self.latency_ok(stats)
    }

    /// Clears both thresholds with margin to spare.
    pub fn is_comfortably_satisfied_by(&self, stats: &BatchStats) -> bool {
        let Some(avg) = stats.average_latency else {
            return false;
        };
        avg.as_secs_f64() < self.max_avg_latency.as_secs_f64() * COMFORT_LATENCY_RATIO
            && stats.error_rate < self.max_error_rate * COMFORT_ERROR_RATIO
    }

    /// successRate × (maxAvgLatency / averageLatency); 0 without latency.
    pub fn score(&self, stats: &BatchStats) -> f64 {
        match stats.average_latency {
            Some(avg) if avg > Duration::ZERO => {
                stats.success_rate() * (self.max_avg_latency.as_secs_f64() / avg.as_secs_f64())
            }
            _ => 0.0,
        }
    }
}

/// Holds the run's thresholds, calibrating exactly once.
#[derive(Debug)]
pub struct ThresholdCalibrator {
    config: ThresholdConfig,
    frozen: Option<Thresholds>,
}

impl ThresholdCalibrator {
    pub fn new(config: ThresholdConfig) -> Self {
        Self {
            config,
            frozen: None,
        }
    }

    /// Thresholds for this run; the first call calibrates from `stats`,
    /// every later call returns the same snapshot.
    pub fn thresholds_for(&mut self, stats: &BatchStats) -> Thresholds {
        *self
            .frozen
            .get_or_insert_with(|| Thresholds::calibrate(stats, &self.config))
    }

    pub fn current(&self) -> Option<Thresholds> {
        self.frozen
    }
}
