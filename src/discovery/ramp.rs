//! Ramp-with-backtracking strategy.
//!
//! # State Transitions
//! ```text
//! RampUp --accepted--> RampUp (C += rampRate)
//! RampUp --rejected--> Backtracked (C = (lastGood + C) / 2)
//! Backtracked --accepted--> Backtracked (C += rampRate)
//! Backtracked --rejected--> Done (result = lastGood)
//! any --C > ceiling--> Done (result = lastGood, ceiling reached)
//! ```

use crate::batch::BatchStats;
use crate::config::RampConfig;
use crate::discovery::state::{RampPhase, Termination};
use crate::discovery::thresholds::Thresholds;

/// What the controller should do after a ramp batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampDecision {
    /// Test this concurrency next.
    Continue(usize),
    Finished {
        capacity: usize,
        termination: Termination,
    },
}

/// Mutable ramp state for one run.
#[derive(Debug, Clone)]
pub struct RampStrategy {
    config: RampConfig,
    ceiling: usize,
    current: usize,
    last_good: usize,
    ramp_rate: usize,
    phase: RampPhase,
}

impl RampStrategy {
    pub fn new(config: RampConfig, ceiling: usize) -> Self {
        let start = config.initial_concurrency.max(1);
        let ramp_rate = config.min_ramp_rate.max(1);
        Self {
            config,
            ceiling,
            current: start,
            last_good: start,
            ramp_rate,
            phase: RampPhase::RampUp,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn last_good(&self) -> usize {
        self.last_good
    }

    pub fn ramp_rate(&self) -> usize {
        self.ramp_rate
    }

    pub fn phase(&self) -> RampPhase {
        self.phase
    }

    /// Feed the stats of the batch run at [`current`](Self::current).
    pub fn observe(&mut self, stats: &BatchStats, thresholds: &Thresholds) -> RampDecision {
        if self.phase == RampPhase::Done {
            return RampDecision::Finished {
                capacity: self.last_good,
                termination: Termination::FailureBoundary,
            };
        }

        if thresholds.is_satisfied_by(stats) {
            self.last_good = self.current;
            self.adjust_rate(thresholds.is_comfortably_satisfied_by(stats));

            let next = self.current + self.ramp_rate;
            if next > self.ceiling {
                tracing::info!(
                    ceiling = self.ceiling,
                    last_good = self.last_good,
                    "Ceiling reached without a failure boundary"
                );
                self.phase = RampPhase::Done;
                return RampDecision::Finished {
                    capacity: self.last_good,
                    termination: Termination::CeilingReached,
                };
            }
            self.current = next;
            return RampDecision::Continue(next);
        }

        match self.phase {
            RampPhase::RampUp => {
                let midpoint = ((self.last_good + self.current) / 2).max(1);
                tracing::info!(
                    failed_at = self.current,
                    last_good = self.last_good,
                    retest = midpoint,
                    "Degradation detected, backtracking"
                );
                self.phase = RampPhase::Backtracked;
                self.current = midpoint;
                RampDecision::Continue(midpoint)
            }
            _ => {
                tracing::info!(
                    failed_at = self.current,
                    last_good = self.last_good,
                    "Degradation detected after backtracking, stopping"
                );
                self.phase = RampPhase::Done;
                RampDecision::Finished {
                    capacity: self.last_good,
                    termination: Termination::FailureBoundary,
                }
            }
        }
    }

    fn adjust_rate(&mut self, comfortable: bool) {
        let factor = if comfortable {
            1.0 + self.config.adjustment_factor
        } else {
            1.0 - self.config.adjustment_factor
        };
        // Negative products saturate to 0 and are clamped back up.
        let scaled = (self.ramp_rate as f64 * factor) as usize;
        let min = self.config.min_ramp_rate.max(1);
        let max = self.config.max_ramp_rate.max(min);
        self.ramp_rate = scaled.clamp(min, max);
    }
}
