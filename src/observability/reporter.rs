//! Line-oriented progress reporting.
//!
//! One line per batch:
//! ```text
//! [ramp-up] concurrency=28 success=28 avg_latency=10.00ms error_rate=0.00% rps=2800.00 verdict=accepted
//! [binary-search] concurrency=250 success=0 avg_latency=n/a error_rate=100.00% rps=25000.00 score=0.00 verdict=rejected
//! ```
//! and a final line with the validated maximum concurrency.

use std::io::{self, Write};

use crate::batch::BatchStats;
use crate::discovery::state::{DiscoveryOutcome, Phase};
use crate::discovery::thresholds::Thresholds;

/// One finished batch, as seen by the controller.
#[derive(Debug)]
pub struct IterationReport<'a> {
    pub phase: Phase,
    pub stats: &'a BatchStats,
    pub thresholds: &'a Thresholds,
    pub accepted: bool,
    /// Search strategy only.
    pub score: Option<f64>,
}

/// Receives progress from the controller.
pub trait Reporter: Send {
    fn iteration(&mut self, report: &IterationReport<'_>);
    fn finished(&mut self, outcome: &DiscoveryOutcome);
}

pub fn format_iteration(report: &IterationReport<'_>) -> String {
    let stats = report.stats;
    let latency = match stats.average_latency {
        Some(avg) => format!("{:.2}ms", avg.as_secs_f64() * 1_000.0),
        None => "n/a".to_string(),
    };

    let mut line = format!(
        "[{}] concurrency={} success={} avg_latency={} error_rate={:.2}% rps={:.2}",
        report.phase,
        stats.concurrency,
        stats.success_count,
        latency,
        stats.error_rate * 100.0,
        stats.requests_per_second,
    );
    if let Some(score) = report.score {
        line.push_str(&format!(" score={:.2}", score));
    }
    line.push_str(if report.accepted {
        " verdict=accepted"
    } else {
        " verdict=rejected"
    });
    line
}

pub fn format_final(outcome: &DiscoveryOutcome) -> String {
    format!(
        "Final validated maximum concurrency: {} (strategy={}, termination={}, batches={}, requests={}, error_rate={:.2}%)",
        outcome.capacity,
        outcome.strategy,
        outcome.termination,
        outcome.totals.batches,
        outcome.totals.requests,
        outcome.totals.error_rate() * 100.0,
    )
}

/// Writes progress lines to any writer, stdout by default.
pub struct ConsoleReporter<W = io::Stdout> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn iteration(&mut self, report: &IterationReport<'_>) {
        let _ = writeln!(self.out, "{}", format_iteration(report));
    }

    fn finished(&mut self, outcome: &DiscoveryOutcome) {
        let _ = writeln!(self.out, "{}", format_final(outcome));
        let _ = self.out.flush();
    }
}
