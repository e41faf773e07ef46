//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Probes and batches produce:
//!     → logging.rs (structured tracing events, stderr)
//!     → metrics.rs (counters, histograms, gauges; optional Prometheus scrape)
//!
//! Controller produces:
//!     → reporter.rs (one progress line per batch plus a final line, stdout)
//! ```
//!
//! # Design Decisions
//! - Progress lines and logs go to different streams so stdout stays line-oriented
//! - Metrics are atomic and recorded directly from probe tasks
//! - The reporter carries no correctness contract

pub mod logging;
pub mod metrics;
pub mod reporter;

pub use reporter::{ConsoleReporter, IterationReport, Reporter};
