//! Batch subsystem: N probes at a fixed concurrency.
//!
//! # Data Flow
//! ```text
//! Controller requests batch at concurrency N
//!     → runner.rs spawns N probe tasks into a JoinSet
//!         → semaphore admits min(N, pool_cap) at a time
//!     → results fold into a per-batch BatchAccumulator (stats.rs)
//!     → deadline (2 × request timeout) or shutdown: abort outstanding tasks
//!     → BatchStats back to the controller
//! ```
//!
//! # Design Decisions
//! - Batches never overlap; stats are final before the next batch starts
//! - Outstanding probes are aborted at the deadline, releasing their connections
//! - Abandoned probes count as failures against the full concurrency

pub mod runner;
pub mod stats;

pub use runner::BatchRunner;
pub use stats::{BatchAccumulator, BatchStats, RunTotals};
