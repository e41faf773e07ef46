//! Retry policy for probes.
//!
//! # Responsibilities
//! - Decide whether a status code or transport error is retryable
//! - Bound the number of retries per probe
//! - Provide the backoff delay before each retry
//!
//! # Design Decisions
//! - Only 429, 500, 502, 503 and 504 are retryable statuses
//! - Connection errors are retryable; timeouts are not
//! - Every other status is a terminal failure on the first attempt

use std::time::Duration;

use crate::config::ProbeConfig;
use crate::resilience::backoff::calculate_backoff;

/// Status codes that trigger a retry.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Returns true if `status` is in the retryable set.
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Bounded retry budget for a single probe.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Whether another attempt is allowed after `attempts` have been made.
    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts <= self.max_retries
    }

    /// Backoff before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        calculate_backoff(retry, self.base_delay, self.max_delay)
    }
}
