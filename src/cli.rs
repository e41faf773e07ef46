//! Command-line interface.
//!
//! Every flag is optional and also readable from a `CAPACITY_PROBE_*`
//! environment variable. Flags that are present override the config file.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{LatencyMode, Strategy, TesterConfig};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Plain,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "capacity-probe")]
#[command(about = "Discover the maximum concurrency an HTTP endpoint sustains", long_about = None)]
pub struct Cli {
    /// Target URL every probe requests
    #[arg(env = "CAPACITY_PROBE_URL")]
    pub url: Option<String>,

    /// TOML config file; flags override its values
    #[arg(short, long, env = "CAPACITY_PROBE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(short, long, value_enum, env = "CAPACITY_PROBE_STRATEGY")]
    pub strategy: Option<Strategy>,

    /// Concurrency of the first ramp batch
    #[arg(long, env = "CAPACITY_PROBE_INITIAL_CONCURRENCY")]
    pub initial_concurrency: Option<usize>,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "CAPACITY_PROBE_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    #[arg(long, env = "CAPACITY_PROBE_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Backoff base delay in milliseconds
    #[arg(long, env = "CAPACITY_PROBE_BASE_DELAY_MS")]
    pub base_delay_ms: Option<u64>,

    /// Backoff cap in milliseconds
    #[arg(long, env = "CAPACITY_PROBE_MAX_DELAY_MS")]
    pub max_delay_ms: Option<u64>,

    /// Highest acceptable error rate (0.0 - 1.0)
    #[arg(long, env = "CAPACITY_PROBE_MAX_ERROR_RATE")]
    pub max_error_rate: Option<f64>,

    #[arg(long, value_enum, env = "CAPACITY_PROBE_LATENCY_MODE")]
    pub latency_mode: Option<LatencyMode>,

    /// Static ceiling in seconds, or the dynamic multiplier
    #[arg(long, env = "CAPACITY_PROBE_LATENCY")]
    pub latency: Option<f64>,

    /// Dynamic ceiling in seconds when the first batch has no successes
    #[arg(long, env = "CAPACITY_PROBE_LATENCY_FALLBACK")]
    pub latency_fallback: Option<f64>,

    /// Maximum probes in flight at once
    #[arg(long, env = "CAPACITY_PROBE_POOL_CAP")]
    pub pool_cap: Option<usize>,

    /// Hard concurrency ceiling
    #[arg(long, env = "CAPACITY_PROBE_CEILING")]
    pub ceiling: Option<usize>,

    /// Upper bound of the binary search
    #[arg(long, env = "CAPACITY_PROBE_INITIAL_GUESS")]
    pub initial_guess: Option<usize>,

    #[arg(long, env = "CAPACITY_PROBE_FINE_TUNE_RADIUS")]
    pub fine_tune_radius: Option<usize>,

    /// First exploratory increment
    #[arg(long, env = "CAPACITY_PROBE_STEP")]
    pub step: Option<usize>,

    #[arg(long, env = "CAPACITY_PROBE_STEP_MULTIPLIER")]
    pub step_multiplier: Option<f64>,

    #[arg(long, env = "CAPACITY_PROBE_MIN_STEP")]
    pub min_step: Option<usize>,

    /// Repeated batches at the ramp result
    #[arg(long, env = "CAPACITY_PROBE_VERIFICATION_ATTEMPTS")]
    pub verification_attempts: Option<u32>,

    /// Pause between batches in milliseconds
    #[arg(long, env = "CAPACITY_PROBE_PAUSE_MS")]
    pub pause_ms: Option<u64>,

    #[arg(long, env = "CAPACITY_PROBE_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[arg(long, value_enum, env = "CAPACITY_PROBE_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Bind address for the Prometheus scrape endpoint
    #[arg(long, env = "CAPACITY_PROBE_METRICS_ADDRESS")]
    pub metrics_address: Option<String>,

    /// Skip the reachability request before the first batch
    #[arg(long, env = "CAPACITY_PROBE_NO_PREFLIGHT")]
    pub no_preflight: bool,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl Cli {
    /// Layer the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut TesterConfig) {
        set(&mut config.target.url, self.url.clone());
        if self.no_preflight {
            config.target.preflight = false;
        }

        set(&mut config.discovery.strategy, self.strategy);
        set(&mut config.discovery.ceiling, self.ceiling);
        set(&mut config.discovery.pause_ms, self.pause_ms);

        set(&mut config.probe.request_timeout_ms, self.timeout_ms);
        set(&mut config.probe.max_retries, self.max_retries);
        set(&mut config.probe.base_delay_ms, self.base_delay_ms);
        set(&mut config.probe.max_delay_ms, self.max_delay_ms);
        set(&mut config.probe.pool_cap, self.pool_cap);

        set(&mut config.thresholds.max_error_rate, self.max_error_rate);
        set(&mut config.thresholds.latency_mode, self.latency_mode);
        set(&mut config.thresholds.dynamic_fallback_secs, self.latency_fallback);
        if let Some(latency) = self.latency {
            match config.thresholds.latency_mode {
                LatencyMode::Static => config.thresholds.static_latency_secs = latency,
                LatencyMode::Dynamic => config.thresholds.dynamic_multiplier = latency,
            }
        }

        set(&mut config.ramp.initial_concurrency, self.initial_concurrency);
        set(&mut config.ramp.verification_attempts, self.verification_attempts);

        set(&mut config.search.initial_guess, self.initial_guess);
        set(&mut config.search.fine_tune_radius, self.fine_tune_radius);
        set(&mut config.search.initial_step, self.step);
        set(&mut config.search.step_multiplier, self.step_multiplier);
        set(&mut config.search.min_step, self.min_step);

        set(&mut config.observability.log_level, self.log_level.clone());
        if let Some(format) = self.log_format {
            config.observability.json_logs = format == LogFormat::Json;
        }
        if self.metrics_address.is_some() {
            config.observability.metrics_address = self.metrics_address.clone();
        }
    }
}
