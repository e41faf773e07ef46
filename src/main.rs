//! capacity-probe
//!
//! Finds the highest concurrency an HTTP endpoint sustains within an error
//! rate and latency budget.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                        CAPACITY PROBE                        │
//!   │                                                              │
//!   │  ┌──────────┐    ┌───────────────┐    ┌─────────────────┐    │
//!   │  │   cli    │───▶│    config     │───▶│    lifecycle    │    │
//!   │  │  + env   │    │ toml+validate │    │    preflight    │    │
//!   │  └──────────┘    └───────────────┘    └────────┬────────┘    │
//!   │                                                │             │
//!   │                                                ▼             │
//!   │  ┌───────────────────────────────────────────────────────┐   │
//!   │  │                discovery::controller                   │   │
//!   │  │   ramp.rs | search.rs  ◀──  thresholds.rs (frozen)     │   │
//!   │  └───────────────────────────┬───────────────────────────┘   │
//!   │                              │ run(C)                        │
//!   │                              ▼                               │
//!   │  ┌───────────────┐    ┌─────────────┐    ┌──────────────┐    │   ┌────────┐
//!   │  │ batch::runner │───▶│    probe    │───▶│  resilience  │────┼──▶│ target │
//!   │  │ JoinSet+sema  │    │ HttpProber  │    │ retry+backoff│    │   └────────┘
//!   │  └───────────────┘    └─────────────┘    └──────────────┘    │
//!   │                                                              │
//!   │  observability: tracing (stderr) · metrics · reporter (stdout)│
//!   └──────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use capacity_probe::cli::Cli;
use capacity_probe::config::loader::{load_config, validate};
use capacity_probe::config::validation::parse_target;
use capacity_probe::config::TesterConfig;
use capacity_probe::discovery::CapacityController;
use capacity_probe::lifecycle::{preflight, Shutdown};
use capacity_probe::observability::{logging, metrics, ConsoleReporter};
use capacity_probe::probe::HttpProber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TesterConfig::default(),
    };
    cli.apply(&mut config);

    logging::init_logging(&config.observability);
    tracing::info!("capacity-probe v{} starting", env!("CARGO_PKG_VERSION"));

    validate(&config)?;
    let target = parse_target(&config.target.url)?;

    tracing::info!(
        target = %target,
        strategy = %config.discovery.strategy,
        pool_cap = config.probe.pool_cap,
        ceiling = config.discovery.ceiling,
        request_timeout_ms = config.probe.request_timeout_ms,
        "Configuration loaded"
    );

    if let Some(address) = &config.observability.metrics_address {
        let addr: SocketAddr = address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let prober = HttpProber::new(&config.probe)?;
    if config.target.preflight {
        preflight(prober.client(), &target, config.probe.request_timeout()).await?;
    }

    let shutdown = Shutdown::new();
    let _signal = shutdown.listen_for_ctrl_c();

    let controller = CapacityController::from_config(
        Arc::new(prober),
        target,
        config,
        ConsoleReporter::stdout(),
        shutdown.token(),
    );
    let (outcome, _) = controller.run().await;

    // Stop the signal listener.
    shutdown.trigger();

    tracing::info!(
        capacity = outcome.capacity,
        termination = %outcome.termination,
        "Run complete"
    );
    Ok(())
}
