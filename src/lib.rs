//! HTTP capacity discovery library.

pub mod batch;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod lifecycle;
pub mod observability;
pub mod probe;
pub mod resilience;

pub use config::schema::TesterConfig;
pub use discovery::{CapacityController, DiscoveryOutcome};
pub use lifecycle::Shutdown;
