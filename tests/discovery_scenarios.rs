//! End-to-end discovery runs against an in-process step-function server.
//!
//! The clock is paused, so every batch of the stub overlaps exactly and the
//! runs are fully deterministic.

use std::sync::Arc;
use std::time::Duration;

use capacity_probe::batch::BatchRunner;
use capacity_probe::config::{ProbeConfig, Strategy, TesterConfig};
use capacity_probe::discovery::{CapacityController, DiscoveryOutcome, Termination};
use capacity_probe::observability::ConsoleReporter;
use capacity_probe::probe::Prober;
use tokio_util::sync::CancellationToken;
use url::Url;

mod common;

use common::{HangingProber, StepServer};

const LATENCY: Duration = Duration::from_millis(10);

fn target() -> Url {
    Url::parse("http://stub.local/").unwrap()
}

fn config(strategy: Strategy) -> TesterConfig {
    let mut config = TesterConfig::default();
    config.target.url = target().to_string();
    config.discovery.strategy = strategy;
    config.discovery.pause_ms = 0;
    config.probe.pool_cap = 1_000;
    config
}

async fn run<P: Prober>(
    prober: P,
    config: TesterConfig,
    shutdown: CancellationToken,
) -> (DiscoveryOutcome, String) {
    let controller = CapacityController::from_config(
        Arc::new(prober),
        target(),
        config,
        ConsoleReporter::new(Vec::new()),
        shutdown,
    );
    let (outcome, reporter) = controller.run().await;
    let output = String::from_utf8(reporter.into_inner()).unwrap();
    (outcome, output)
}

fn tested(outcome: &DiscoveryOutcome) -> Vec<usize> {
    outcome.history.iter().map(|s| s.concurrency).collect()
}

#[tokio::test(start_paused = true)]
async fn test_ramp_finds_step_at_fifty() {
    let (outcome, output) = run(
        StepServer::new(50, LATENCY),
        config(Strategy::Ramp),
        CancellationToken::new(),
    )
    .await;

    assert!((45..=55).contains(&outcome.capacity));
    assert_eq!(outcome.capacity, 45);
    assert!(outcome.capacity <= outcome.highest_tested());
    assert_eq!(outcome.termination, Termination::FailureBoundary);

    // 60 fails, backtrack to 52 fails, then three verification batches at 45.
    assert_eq!(tested(&outcome), vec![28, 35, 45, 60, 52, 45, 45, 45]);
    assert_eq!(outcome.totals.batches, 8);

    let thresholds = outcome.thresholds.unwrap();
    assert_eq!(thresholds.max_avg_latency, Duration::from_millis(15));

    assert!(output.starts_with("[ramp-up] concurrency=28 success=28"));
    assert!(output.contains("[backtracked] concurrency=52 success=0"));
    assert!(output.contains("[verification] concurrency=45"));
    assert!(output.ends_with("Final validated maximum concurrency: 45 (strategy=ramp, termination=failure-boundary, batches=8, requests=355, error_rate=31.55%)\n"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_verification_lowers_result() {
    // 28 + 35 + 45 + 60 + 52 calls reach the ramp result; verification fails.
    let server = StepServer::degrading(50, LATENCY, 220);
    let (outcome, output) = run(server, config(Strategy::Ramp), CancellationToken::new()).await;

    assert_eq!(tested(&outcome), vec![28, 35, 45, 60, 52, 45, 45, 45]);
    assert_eq!(outcome.capacity, 42);
    assert_eq!(outcome.termination, Termination::FailureBoundary);
    assert_eq!(
        output.matches("[verification] concurrency=45 success=0").count(),
        3
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_verification_never_goes_below_one() {
    let mut config = config(Strategy::Ramp);
    config.ramp.initial_concurrency = 1;

    // 1 passes, 8 fails, backtrack to 4 fails: 13 calls, result 1.
    let server = StepServer::degrading(1, LATENCY, 13);
    let (outcome, _) = run(server, config, CancellationToken::new()).await;

    assert_eq!(tested(&outcome), vec![1, 8, 4, 1, 1, 1]);
    assert_eq!(outcome.capacity, 1);
}

#[tokio::test(start_paused = true)]
async fn test_search_finds_step_at_fifty() {
    let (outcome, output) = run(
        StepServer::new(50, LATENCY),
        config(Strategy::Search),
        CancellationToken::new(),
    )
    .await;

    assert_eq!(outcome.capacity, 50);
    assert_eq!(outcome.termination, Termination::FailureBoundary);

    let mut expected = vec![250, 125, 62, 31, 46, 54, 50, 52, 51];
    expected.extend(45..=55);
    expected.push(550);
    assert_eq!(tested(&outcome), expected);

    // The fine-tune scan accepts exactly 45..=50.
    let scan: Vec<bool> = outcome.history[9..20]
        .iter()
        .map(|s| s.success_count == s.concurrency)
        .collect();
    assert_eq!(scan, [[true; 6].as_slice(), [false; 5].as_slice()].concat());

    // First batch had no successes, so the latency ceiling is the fallback.
    assert_eq!(
        outcome.thresholds.unwrap().max_avg_latency,
        Duration::from_secs(2)
    );
    assert!(output.starts_with("[binary-search] concurrency=250 success=0 avg_latency=n/a"));
    assert!(output.contains("[fine-tune] concurrency=50"));
    assert!(output.contains("[exploratory] concurrency=550"));
}

#[tokio::test(start_paused = true)]
async fn test_search_is_exact_below_initial_guess() {
    for limit in [1, 37, 128, 499, 500] {
        let (outcome, _) = run(
            StepServer::new(limit, LATENCY),
            config(Strategy::Search),
            CancellationToken::new(),
        )
        .await;
        assert_eq!(outcome.capacity, limit, "limit {}", limit);
    }
}

#[tokio::test(start_paused = true)]
async fn test_runs_are_deterministic() {
    for strategy in [Strategy::Ramp, Strategy::Search] {
        let (first, first_output) = run(
            StepServer::new(73, LATENCY),
            config(strategy),
            CancellationToken::new(),
        )
        .await;
        let (second, second_output) = run(
            StepServer::new(73, LATENCY),
            config(strategy),
            CancellationToken::new(),
        )
        .await;

        assert_eq!(first.capacity, second.capacity);
        assert_eq!(first.history, second.history);
        assert_eq!(first_output, second_output);
    }
}

#[tokio::test(start_paused = true)]
async fn test_ceiling_ends_ramp() {
    let mut config = config(Strategy::Ramp);
    config.discovery.ceiling = 40;
    config.ramp.verification_attempts = 0;

    let (outcome, _) = run(StepServer::new(500, LATENCY), config, CancellationToken::new()).await;

    assert_eq!(outcome.termination, Termination::CeilingReached);
    assert_eq!(tested(&outcome), vec![28, 35]);
    assert_eq!(outcome.capacity, 35);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_batch_resolves_at_deadline() {
    let probe = ProbeConfig {
        request_timeout_ms: 1_000,
        ..ProbeConfig::default()
    };
    let runner = BatchRunner::from_config(Arc::new(HangingProber), target(), &probe);

    let started = tokio::time::Instant::now();
    let stats = runner.run(25, &CancellationToken::new()).await;
    let waited = started.elapsed();

    assert!(waited >= Duration::from_secs(2));
    assert!(waited < Duration::from_secs(2) + Duration::from_millis(50));
    assert_eq!(stats.success_count, 0);
    assert_eq!(stats.abandoned_count, 25);
    assert_eq!(stats.error_rate, 1.0);
    assert_eq!(stats.average_latency, None);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_mid_run_reports_last_good() {
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        // Lands inside the third batch (20ms - 30ms).
        tokio::time::sleep(Duration::from_millis(25)).await;
        trigger.cancel();
    });

    let (outcome, output) = run(StepServer::new(500, LATENCY), config(Strategy::Ramp), shutdown).await;

    assert_eq!(outcome.termination, Termination::Cancelled);
    assert_eq!(tested(&outcome), vec![28, 35]);
    assert_eq!(outcome.capacity, 35);
    assert!(output.contains("termination=cancelled"));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_before_first_batch() {
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let (outcome, _) = run(StepServer::new(50, LATENCY), config(Strategy::Search), shutdown).await;

    assert_eq!(outcome.capacity, 0);
    assert_eq!(outcome.termination, Termination::Cancelled);
    assert!(outcome.history.is_empty());
    assert!(outcome.thresholds.is_none());
}
