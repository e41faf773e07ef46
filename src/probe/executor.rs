//! Probe execution against a live HTTP endpoint.
//!
//! # Responsibilities
//! - Issue one GET per probe through a shared, pooled client
//! - Retry retryable statuses and connection errors with backoff
//! - Measure the latency of the final successful attempt
//! - Classify every outcome; never propagate an error to the batch

use std::future::Future;

use reqwest::Client;
use tokio::time::Instant;
use url::Url;

use crate::config::ProbeConfig;
use crate::observability::metrics;
use crate::probe::result::{FailureKind, ProbeResult};
use crate::resilience::retries::{is_retryable_status, RetryPolicy};

/// Something that can probe a target once.
///
/// Implementations must swallow and classify every error: a probe always
/// resolves to a [`ProbeResult`].
pub trait Prober: Send + Sync + 'static {
    fn probe(&self, target: &Url) -> impl Future<Output = ProbeResult> + Send;
}

/// Outcome of a single attempt, before the retry decision.
enum Attempt {
    Done(ProbeResult),
    Retry(FailureKind),
}

/// reqwest-backed prober sharing one connection pool for the whole run.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    retry: RetryPolicy,
}

impl HttpProber {
    /// Build the client from probe configuration.
    ///
    /// The pool keeps up to `pool_cap` idle connections per host so a batch at
    /// full width can reuse the previous batch's connections.
    pub fn new(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(config.pool_cap)
            .user_agent(concat!("capacity-probe/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Underlying HTTP client, shared with the startup preflight.
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn attempt(&self, target: &Url) -> Attempt {
        let started = Instant::now();

        let response = match self.client.get(target.clone()).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                tracing::trace!(error = %e, "Probe timed out");
                return Attempt::Done(ProbeResult::Failure(FailureKind::Timeout));
            }
            Err(e) if e.is_connect() => {
                tracing::trace!(error = %e, "Probe connection failed");
                return Attempt::Retry(FailureKind::Transport);
            }
            Err(e) => {
                tracing::trace!(error = %e, "Probe transport error");
                return Attempt::Done(ProbeResult::Failure(FailureKind::Transport));
            }
        };

        let status = response.status().as_u16();

        // Drain the body so the connection goes back to the pool.
        if let Err(e) = response.bytes().await {
            let kind = if e.is_timeout() {
                FailureKind::Timeout
            } else {
                FailureKind::Transport
            };
            return Attempt::Done(ProbeResult::Failure(kind));
        }

        if status == 200 {
            Attempt::Done(ProbeResult::Success {
                latency: started.elapsed(),
            })
        } else if is_retryable_status(status) {
            Attempt::Retry(FailureKind::Status(status))
        } else {
            Attempt::Done(ProbeResult::Failure(FailureKind::Status(status)))
        }
    }
}

impl Prober for HttpProber {
    async fn probe(&self, target: &Url) -> ProbeResult {
        let mut attempts = 0;

        let result = loop {
            attempts += 1;

            match self.attempt(target).await {
                Attempt::Done(result) => break result,
                Attempt::Retry(kind) if self.retry.should_retry(attempts) => {
                    let delay = self.retry.delay(attempts);
                    tracing::debug!(attempt = attempts, delay = ?delay, failure = ?kind, "Retrying probe");
                    metrics::record_retry(kind);
                    tokio::time::sleep(delay).await;
                }
                Attempt::Retry(kind) => break ProbeResult::Failure(kind),
            }
        };

        metrics::record_probe(&result);
        result
    }
}
