//! Probe outcome types.

use std::time::Duration;

/// Why a probe failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Response arrived with a status other than 200.
    Status(u16),
    /// DNS, connect, TLS or body transfer failure.
    Transport,
    /// The per-request timeout elapsed.
    Timeout,
    /// Cancelled at the batch deadline or on shutdown.
    Abandoned,
    /// The probe task panicked.
    Panicked,
}

impl FailureKind {
    /// Metric label for this failure.
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Status(_) => "status",
            FailureKind::Transport => "transport",
            FailureKind::Timeout => "timeout",
            FailureKind::Abandoned => "abandoned",
            FailureKind::Panicked => "panicked",
        }
    }
}

/// Final outcome of one probe, after any retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    Success { latency: Duration },
    Failure(FailureKind),
}

impl ProbeResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeResult::Success { .. })
    }

    /// Latency sample; `None` for every failure.
    pub fn latency(&self) -> Option<Duration> {
        match self {
            ProbeResult::Success { latency } => Some(*latency),
            ProbeResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            ProbeResult::Success { .. } => None,
            ProbeResult::Failure(kind) => Some(*kind),
        }
    }
}
