//! Capacity-discovery subsystem.
//!
//! # Data Flow
//! ```text
//! controller.rs
//!     → BatchRunner::run(C)                (batch subsystem)
//!     → thresholds.rs (first batch calibrates, then frozen)
//!     → ramp.rs | search.rs (accept/reject, next C or done)
//!     → Reporter (progress line)
//!     → repeat until done, then verification (ramp only)
//! ```
//!
//! # Design Decisions
//! - Strategies are synchronous state machines; only the controller awaits
//! - Batches are strictly sequential
//! - Thresholds never recompute mid-run, even if the first batch was anomalous
//! - The reported capacity is always a concurrency that was actually tested

pub mod controller;
pub mod ramp;
pub mod search;
pub mod state;
pub mod thresholds;

pub use controller::CapacityController;
pub use ramp::{RampDecision, RampStrategy};
pub use search::SearchStrategy;
pub use state::{DiscoveryOutcome, Phase, RampPhase, SearchPhase, Termination};
pub use thresholds::{ThresholdCalibrator, Thresholds};
