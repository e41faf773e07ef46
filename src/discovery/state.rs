//! Discovery phases, termination reasons and run outcome.

use std::fmt;

use crate::batch::{BatchStats, RunTotals};
use crate::config::Strategy;
use crate::discovery::thresholds::Thresholds;

/// Ramp strategy phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampPhase {
    RampUp,
    /// One failure seen; the next failure ends the run.
    Backtracked,
    Done,
}

/// Search strategy phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    BinarySearch,
    LocalFineTune,
    ExploratoryGrowth,
    Done,
}

/// Label attached to each reported iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ramp(RampPhase),
    Verification,
    Search(SearchPhase),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Ramp(RampPhase::RampUp) => "ramp-up",
            Phase::Ramp(RampPhase::Backtracked) => "backtracked",
            Phase::Ramp(RampPhase::Done) | Phase::Search(SearchPhase::Done) => "done",
            Phase::Verification => "verification",
            Phase::Search(SearchPhase::BinarySearch) => "binary-search",
            Phase::Search(SearchPhase::LocalFineTune) => "fine-tune",
            Phase::Search(SearchPhase::ExploratoryGrowth) => "exploratory",
        };
        f.write_str(label)
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A rejected batch bounded the capacity from above.
    FailureBoundary,
    /// The hard ceiling was reached without a failure boundary.
    CeilingReached,
    /// No tested concurrency was ever accepted.
    Exhausted,
    /// Shutdown was requested mid-run.
    Cancelled,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Termination::FailureBoundary => "failure-boundary",
            Termination::CeilingReached => "ceiling-reached",
            Termination::Exhausted => "exhausted",
            Termination::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    pub strategy: Strategy,
    /// Validated maximum concurrency; 0 when nothing was accepted.
    pub capacity: usize,
    pub termination: Termination,
    /// `None` only if the run was cancelled before the first batch finished.
    pub thresholds: Option<Thresholds>,
    /// Every batch in execution order, verification included.
    pub history: Vec<BatchStats>,
    pub totals: RunTotals,
}

impl DiscoveryOutcome {
    /// Highest concurrency any batch of the run used.
    pub fn highest_tested(&self) -> usize {
        self.history
            .iter()
            .map(|stats| stats.concurrency)
            .max()
            .unwrap_or(0)
    }
}
