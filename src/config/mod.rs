//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → CLI flags / CAPACITY_PROBE_* environment (override, in main.rs)
//!     → validation.rs (semantic checks)
//!     → TesterConfig (validated, immutable for the run)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a run starts
//! - All fields have defaults to allow a URL-only invocation
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    DiscoveryConfig, LatencyMode, ObservabilityConfig, ProbeConfig, RampConfig, SearchConfig,
    Strategy, TargetConfig, TesterConfig, ThresholdConfig,
};
