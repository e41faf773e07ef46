//! Probe subsystem: one HTTP GET, timed and classified.
//!
//! # Data Flow
//! ```text
//! BatchRunner task
//!     → Prober::probe(target)
//!         → GET with per-request timeout
//!         → retryable status / connection error: resilience::retries + backoff
//!     → ProbeResult (Success with latency, or classified Failure)
//! ```
//!
//! # Design Decisions
//! - Success is HTTP 200 only; every other status is a failure
//! - Failures never carry a latency sample
//! - `Prober` is a trait so batches can run against in-process stubs

pub mod executor;
pub mod result;

pub use executor::{HttpProber, Prober};
pub use result::{FailureKind, ProbeResult};
