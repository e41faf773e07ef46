//! Metrics collection and exposition.
//!
//! # Metrics
//! - `capacity_probe_requests_total` (counter): probe outcomes by `outcome`
//! - `capacity_probe_retries_total` (counter): retries by `reason`
//! - `capacity_probe_latency_seconds` (histogram): successful probe latency
//! - `capacity_probe_batches_total` (counter): batches by `verdict`
//! - `capacity_probe_batch_concurrency` (gauge): concurrency of the last batch
//! - `capacity_probe_batch_error_rate` (gauge): error rate of the last batch

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::batch::BatchStats;
use crate::probe::{FailureKind, ProbeResult};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_probe(result: &ProbeResult) {
    match result {
        ProbeResult::Success { latency } => {
            ::metrics::counter!("capacity_probe_requests_total", "outcome" => "success").increment(1);
            ::metrics::histogram!("capacity_probe_latency_seconds").record(latency.as_secs_f64());
        }
        ProbeResult::Failure(kind) => {
            ::metrics::counter!("capacity_probe_requests_total", "outcome" => kind.label()).increment(1);
        }
    }
}

pub fn record_retry(reason: FailureKind) {
    let reason = match reason {
        FailureKind::Status(code) => code.to_string(),
        other => other.label().to_string(),
    };
    ::metrics::counter!("capacity_probe_retries_total", "reason" => reason).increment(1);
}

pub fn record_batch(stats: &BatchStats, accepted: bool) {
    let verdict = if accepted { "accepted" } else { "rejected" };
    ::metrics::counter!("capacity_probe_batches_total", "verdict" => verdict).increment(1);
    ::metrics::gauge!("capacity_probe_batch_concurrency").set(stats.concurrency as f64);
    ::metrics::gauge!("capacity_probe_batch_error_rate").set(stats.error_rate);
    if stats.abandoned_count > 0 {
        ::metrics::counter!("capacity_probe_requests_total", "outcome" => "abandoned")
            .increment(stats.abandoned_count as u64);
    }
}
