//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Parse target → Build client → Preflight request → First batch
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → Cancel token → Abort batch in flight → Report best known value
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and happens before load is generated
//! - Shutdown is cooperative through a single CancellationToken

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{preflight, StartupError};
