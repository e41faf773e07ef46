//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a capacity run.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for a capacity-discovery run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TesterConfig {
    /// Endpoint under test.
    pub target: TargetConfig,

    /// Per-probe HTTP behavior (timeouts, retries, pool size).
    pub probe: ProbeConfig,

    /// Acceptance thresholds.
    pub thresholds: ThresholdConfig,

    /// Strategy selection and run-wide limits.
    pub discovery: DiscoveryConfig,

    /// Ramp strategy tuning.
    pub ramp: RampConfig,

    /// Search strategy tuning.
    pub search: SearchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Target endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetConfig {
    /// URL every probe issues a GET against.
    pub url: String,

    /// Issue a single reachability request before the first batch.
    pub preflight: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            preflight: true,
        }
    }
}

/// Probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Per-request timeout in milliseconds. The batch deadline is twice this.
    pub request_timeout_ms: u64,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Maximum retry attempts after the first request.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Maximum probes in flight at once, and idle connections kept per host.
    pub pool_cap: usize,
}

impl ProbeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Deadline after which still-pending probes of a batch are abandoned.
    pub fn batch_deadline(&self) -> Duration {
        self.request_timeout() * 2
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2_000,
            pool_cap: 100,
        }
    }
}

/// How the latency ceiling is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LatencyMode {
    /// Fixed number of seconds.
    Static,
    /// Multiple of the first batch's average latency.
    #[default]
    Dynamic,
}

/// Threshold configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Highest acceptable error rate (0.0 - 1.0).
    pub max_error_rate: f64,

    /// Static or dynamic latency ceiling.
    pub latency_mode: LatencyMode,

    /// Latency ceiling in seconds for static mode.
    pub static_latency_secs: f64,

    /// Multiplier applied to the first batch's average latency in dynamic mode.
    pub dynamic_multiplier: f64,

    /// Ceiling used in dynamic mode when the first batch had no successful probe.
    pub dynamic_fallback_secs: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            max_error_rate: 0.05,
            latency_mode: LatencyMode::Dynamic,
            static_latency_secs: 1.0,
            dynamic_multiplier: 1.5,
            dynamic_fallback_secs: 2.0,
        }
    }
}

/// Capacity-discovery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Incremental ramp with one backtracking step.
    #[default]
    Ramp,
    /// Binary search, local fine-tune, then exploratory growth.
    Search,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Ramp => write!(f, "ramp"),
            Strategy::Search => write!(f, "search"),
        }
    }
}

/// Strategy selection and limits shared by both strategies.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub strategy: Strategy,

    /// Hard concurrency ceiling; exceeding it ends the run.
    pub ceiling: usize,

    /// Pause between consecutive batches in milliseconds.
    pub pause_ms: u64,
}

impl DiscoveryConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Ramp,
            ceiling: 1_000,
            pause_ms: 2_000,
        }
    }
}

/// Ramp strategy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RampConfig {
    /// Concurrency of the first batch.
    pub initial_concurrency: usize,

    /// Smallest increment between accepted batches.
    pub min_ramp_rate: usize,

    /// Largest increment between accepted batches.
    pub max_ramp_rate: usize,

    /// Multiplicative factor: rate grows by (1 + f) or shrinks by (1 - f).
    pub adjustment_factor: f64,

    /// Repeated batches at the final value.
    pub verification_attempts: u32,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            initial_concurrency: 28,
            min_ramp_rate: 5,
            max_ramp_rate: 100,
            adjustment_factor: 0.5,
            verification_attempts: 3,
        }
    }
}

/// Search strategy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Upper bound of the binary search interval [1, initial_guess].
    pub initial_guess: usize,

    /// A batch is accepted only if its success rate is strictly above this.
    pub min_success_rate: f64,

    /// Half-width of the ascending fine-tune scan around the search result.
    pub fine_tune_radius: usize,

    /// First exploratory increment above the fine-tuned best.
    pub initial_step: usize,

    /// Step growth factor while latency stays flat.
    pub step_multiplier: f64,

    /// Step never shrinks below this.
    pub min_step: usize,

    /// Relative latency growth tolerated before the step is halved.
    pub latency_growth_limit: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            initial_guess: 500,
            min_success_rate: 0.9,
            fine_tune_radius: 5,
            initial_step: 500,
            step_multiplier: 2.0,
            min_step: 100,
            latency_growth_limit: 0.2,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Prometheus scrape endpoint bind address; disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_address: None,
        }
    }
}
