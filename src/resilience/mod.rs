//! Resilience subsystem for individual probes.
//!
//! # Data Flow
//! ```text
//! Probe attempt fails:
//!     → retries.rs (is the status or error retryable? attempts left?)
//!     → backoff.rs (exponential delay with jitter)
//!     → next attempt, invisible to the batch layer
//! ```
//!
//! # Design Decisions
//! - Retries only live at the probe layer; batches are never replayed
//! - Timeouts are terminal, not retried
//! - Backoff carries up to 10% jitter

pub mod backoff;
pub mod retries;

pub use backoff::calculate_backoff;
pub use retries::RetryPolicy;
