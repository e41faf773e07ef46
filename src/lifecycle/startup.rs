//! Startup checks.
//!
//! # Responsibilities
//! - Confirm the target answers before any load is generated
//!
//! # Design Decisions
//! - Fail fast: an unreachable target is fatal
//! - Any HTTP response counts as reachable; a non-200 only warns

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("target {url} did not respond within {timeout:?}")]
    Timeout { url: Url, timeout: Duration },

    #[error("target {url} is unreachable: {source}")]
    Unreachable {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
}

/// Send a single GET to the target.
pub async fn preflight(
    client: &Client,
    target: &Url,
    timeout: Duration,
) -> Result<StatusCode, StartupError> {
    tracing::info!(target = %target, "Preflight request");

    let response = client
        .get(target.clone())
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                StartupError::Timeout {
                    url: target.clone(),
                    timeout,
                }
            } else {
                StartupError::Unreachable {
                    url: target.clone(),
                    source: e,
                }
            }
        })?;

    let status = response.status();
    if status == StatusCode::OK {
        tracing::info!(target = %target, status = status.as_u16(), "Target reachable");
    } else {
        tracing::warn!(
            target = %target,
            status = status.as_u16(),
            "Target reachable but preflight did not return 200"
        );
    }
    Ok(status)
}
