//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the target URL is an absolute http(s) URL with a host
//! - Validate value ranges (rates in [0,1], concurrency >= 1, timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TesterConfig → Result<(), Vec<ValidationError>>
//! - Runs before any request is issued

use thiserror::Error;
use url::Url;

use crate::config::schema::{LatencyMode, TesterConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("target url is required")]
    MissingUrl,

    #[error("target url '{url}' is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{field} must be at least {min}, got {value}")]
    TooSmall {
        field: &'static str,
        min: f64,
        value: f64,
    },

    #[error("{field} must be within [0, 1], got {value}")]
    NotARate { field: &'static str, value: f64 },

    #[error("min_ramp_rate ({min}) exceeds max_ramp_rate ({max})")]
    RampRange { min: usize, max: usize },

    #[error("initial_concurrency ({initial}) exceeds ceiling ({ceiling})")]
    InitialAboveCeiling { initial: usize, ceiling: usize },
}

/// Parse and check the target URL.
pub fn parse_target(raw: &str) -> Result<Url, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::MissingUrl);
    }
    let invalid = |reason: String| ValidationError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Validate every semantic constraint, collecting all failures.
pub fn validate_config(config: &TesterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = parse_target(&config.target.url) {
        errors.push(e);
    }

    let mut at_least = |field: &'static str, value: f64, min: f64| {
        if value.is_nan() || value < min {
            errors.push(ValidationError::TooSmall { field, min, value });
        }
    };

    at_least("probe.request_timeout_ms", config.probe.request_timeout_ms as f64, 1.0);
    at_least("probe.connect_timeout_ms", config.probe.connect_timeout_ms as f64, 1.0);
    at_least("probe.pool_cap", config.probe.pool_cap as f64, 1.0);
    at_least("discovery.ceiling", config.discovery.ceiling as f64, 1.0);
    at_least("ramp.initial_concurrency", config.ramp.initial_concurrency as f64, 1.0);
    at_least("ramp.min_ramp_rate", config.ramp.min_ramp_rate as f64, 1.0);
    at_least("ramp.adjustment_factor", config.ramp.adjustment_factor, 0.0);
    at_least("search.initial_guess", config.search.initial_guess as f64, 1.0);
    at_least("search.initial_step", config.search.initial_step as f64, 1.0);
    at_least("search.min_step", config.search.min_step as f64, 1.0);
    at_least("search.step_multiplier", config.search.step_multiplier, 1.0);
    at_least("search.latency_growth_limit", config.search.latency_growth_limit, 0.0);
    at_least("thresholds.dynamic_fallback_secs", config.thresholds.dynamic_fallback_secs, 0.0);

    match config.thresholds.latency_mode {
        LatencyMode::Static => at_least(
            "thresholds.static_latency_secs",
            config.thresholds.static_latency_secs,
            f64::MIN_POSITIVE,
        ),
        LatencyMode::Dynamic => at_least(
            "thresholds.dynamic_multiplier",
            config.thresholds.dynamic_multiplier,
            f64::MIN_POSITIVE,
        ),
    }

    for (field, value) in [
        ("thresholds.max_error_rate", config.thresholds.max_error_rate),
        ("search.min_success_rate", config.search.min_success_rate),
    ] {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ValidationError::NotARate { field, value });
        }
    }

    if config.ramp.min_ramp_rate > config.ramp.max_ramp_rate {
        errors.push(ValidationError::RampRange {
            min: config.ramp.min_ramp_rate,
            max: config.ramp.max_ramp_rate,
        });
    }

    if config.ramp.initial_concurrency > config.discovery.ceiling {
        errors.push(ValidationError::InitialAboveCeiling {
            initial: config.ramp.initial_concurrency,
            ceiling: config.discovery.ceiling,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
