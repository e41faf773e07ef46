//! Binary search, local fine-tune and exploratory growth.
//!
//! # Phases
//! ```text
//! BinarySearch      [1, initial_guess], best = largest accepted midpoint
//! LocalFineTune     ascending scan of [best - r, best + r]; last acceptance wins
//! ExploratoryGrowth best + step, best + step + step', ... until first rejection
//! Done              result = final_max
//! ```
//!
//! The fine-tune scan must stay ascending: "last acceptance wins" only yields
//! the neighborhood maximum because later values are larger. Exploratory
//! growth is approximate; the result is within one (final) step of the true
//! boundary and is never refined.

use std::time::Duration;

use crate::batch::BatchStats;
use crate::config::SearchConfig;
use crate::discovery::state::{SearchPhase, Termination};
use crate::discovery::thresholds::Thresholds;

/// Mutable search state for one run.
#[derive(Debug, Clone)]
pub struct SearchStrategy {
    config: SearchConfig,
    ceiling: usize,
    phase: SearchPhase,

    // BinarySearch bounds, inclusive.
    low: usize,
    high: usize,

    best: usize,
    best_stats: Option<BatchStats>,

    // LocalFineTune cursor, inclusive end.
    scan_next: usize,
    scan_end: usize,

    current: usize,
    step: usize,
    previous_latency: Option<Duration>,
    final_max: usize,
    termination: Option<Termination>,
}

impl SearchStrategy {
    pub fn new(config: SearchConfig, ceiling: usize) -> Self {
        let high = config.initial_guess.min(ceiling).max(1);
        let step = config.initial_step.max(1);
        Self {
            config,
            ceiling,
            phase: SearchPhase::BinarySearch,
            low: 1,
            high,
            best: 0,
            best_stats: None,
            scan_next: 0,
            scan_end: 0,
            current: 0,
            step,
            previous_latency: None,
            final_max: 0,
            termination: None,
        }
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    /// Largest accepted concurrency of the search and fine-tune phases.
    pub fn best(&self) -> usize {
        self.best
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Best value known so far, across all phases.
    pub fn result(&self) -> usize {
        self.final_max.max(self.best)
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Acceptance predicate: successRate > min_success_rate and latency within bounds.
    pub fn accepts(&self, stats: &BatchStats, thresholds: &Thresholds) -> bool {
        stats.success_rate() > self.config.min_success_rate && thresholds.latency_ok(stats)
    }

    /// Next concurrency to test, moving through phases as each is exhausted.
    /// `None` once the search is done.
    pub fn next_concurrency(&mut self) -> Option<usize> {
        loop {
            match self.phase {
                SearchPhase::BinarySearch => {
                    if self.low <= self.high {
                        return Some(self.low + (self.high - self.low) / 2);
                    }
                    self.enter_fine_tune();
                }
                SearchPhase::LocalFineTune => {
                    if self.scan_next <= self.scan_end {
                        return Some(self.scan_next);
                    }
                    self.enter_exploratory();
                }
                SearchPhase::ExploratoryGrowth => {
                    if self.current > self.ceiling {
                        tracing::info!(
                            ceiling = self.ceiling,
                            final_max = self.final_max,
                            "Ceiling reached during exploratory growth"
                        );
                        self.finish(Termination::CeilingReached);
                        continue;
                    }
                    return Some(self.current);
                }
                SearchPhase::Done => return None,
            }
        }
    }

    /// Feed the stats of the batch run at the concurrency last returned by
    /// [`next_concurrency`](Self::next_concurrency).
    pub fn observe(&mut self, concurrency: usize, stats: &BatchStats, thresholds: &Thresholds) {
        let accepted = self.accepts(stats, thresholds);

        match self.phase {
            SearchPhase::BinarySearch => {
                if accepted {
                    self.record_best(concurrency, stats);
                    self.low = concurrency + 1;
                } else {
                    self.high = concurrency - 1;
                }
            }
            SearchPhase::LocalFineTune => {
                if accepted {
                    self.record_best(concurrency, stats);
                }
                self.scan_next = concurrency + 1;
            }
            SearchPhase::ExploratoryGrowth => {
                if !accepted {
                    tracing::info!(
                        rejected_at = concurrency,
                        final_max = self.final_max,
                        "Exploratory growth stopped at first rejection"
                    );
                    self.finish(Termination::FailureBoundary);
                    return;
                }
                self.final_max = concurrency;
                self.adapt_step(stats.average_latency);
                self.current = concurrency.saturating_add(self.step);
            }
            SearchPhase::Done => {}
        }
    }

    fn record_best(&mut self, concurrency: usize, stats: &BatchStats) {
        self.best = concurrency;
        self.best_stats = Some(stats.clone());
    }

    fn enter_fine_tune(&mut self) {
        let radius = self.config.fine_tune_radius;
        self.scan_next = self.best.saturating_sub(radius).max(1);
        self.scan_end = self.best.saturating_add(radius).min(self.ceiling);
        tracing::info!(
            best = self.best,
            from = self.scan_next,
            to = self.scan_end,
            "Binary search complete, fine-tuning"
        );
        self.phase = SearchPhase::LocalFineTune;
    }

    fn enter_exploratory(&mut self) {
        if self.best == 0 {
            tracing::warn!("No concurrency level was accepted");
            self.finish(Termination::Exhausted);
            return;
        }
        self.final_max = self.best;
        self.previous_latency = self.best_stats.as_ref().and_then(|s| s.average_latency);
        self.current = self.best.saturating_add(self.step);
        tracing::info!(
            best = self.best,
            best_latency = ?self.previous_latency,
            start = self.current,
            step = self.step,
            "Fine-tune complete, exploring upward"
        );
        self.phase = SearchPhase::ExploratoryGrowth;
    }

    fn adapt_step(&mut self, latency: Option<Duration>) {
        let growth = match (self.previous_latency, latency) {
            (Some(prev), Some(now)) if prev > Duration::ZERO => {
                (now.as_secs_f64() - prev.as_secs_f64()) / prev.as_secs_f64()
            }
            _ => 0.0,
        };

        let next = if growth < self.config.latency_growth_limit {
            (self.step as f64 * self.config.step_multiplier) as usize
        } else {
            (self.step / 2).max(self.config.min_step)
        };
        // A step past the ceiling only ever tests values above it.
        self.step = next.clamp(1, self.ceiling.max(1));

        if latency.is_some() {
            self.previous_latency = latency;
        }
    }

    fn finish(&mut self, termination: Termination) {
        self.phase = SearchPhase::Done;
        self.termination = Some(termination);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{FailureKind, ProbeResult};

    fn thresholds() -> Thresholds {
        Thresholds {
            max_error_rate: 0.05,
            max_avg_latency: Duration::from_secs(1),
        }
    }

    fn stats(concurrency: usize, pass: bool, latency: Duration) -> BatchStats {
        let result = if pass {
            ProbeResult::Success { latency }
        } else {
            ProbeResult::Failure(FailureKind::Status(503))
        };
        BatchStats::from_results(concurrency, &vec![result; concurrency], Duration::from_secs(1))
    }

    /// Run to completion against "accept iff concurrency <= limit",
    /// returning every tested value with its phase.
    fn drive(
        strategy: &mut SearchStrategy,
        limit: usize,
        latency: impl Fn(usize) -> Duration,
    ) -> Vec<(SearchPhase, usize)> {
        let mut tested = Vec::new();
        while let Some(c) = strategy.next_concurrency() {
            tested.push((strategy.phase(), c));
            strategy.observe(c, &stats(c, c <= limit, latency(c)), &thresholds());
        }
        tested
    }

    fn flat(_: usize) -> Duration {
        Duration::from_millis(10)
    }

    #[test]
    fn test_binary_search_finds_exact_boundary() {
        for limit in [1, 2, 37, 50, 128, 250, 499, 500] {
            let mut strategy = SearchStrategy::new(SearchConfig::default(), 1_000);
            while let Some(c) = strategy.next_concurrency() {
                if strategy.phase() != SearchPhase::BinarySearch {
                    break;
                }
                strategy.observe(c, &stats(c, c <= limit, flat(c)), &thresholds());
            }
            assert_eq!(strategy.best(), limit, "limit {}", limit);
        }
    }

    #[test]
    fn test_full_run_at_fifty() {
        let mut strategy = SearchStrategy::new(SearchConfig::default(), 1_000);
        let tested = drive(&mut strategy, 50, flat);

        let search: Vec<usize> = tested
            .iter()
            .filter(|(p, _)| *p == SearchPhase::BinarySearch)
            .map(|(_, c)| *c)
            .collect();
        assert_eq!(search, vec![250, 125, 62, 31, 46, 54, 50, 52, 51]);

        let scan: Vec<usize> = tested
            .iter()
            .filter(|(p, _)| *p == SearchPhase::LocalFineTune)
            .map(|(_, c)| *c)
            .collect();
        assert_eq!(scan, (45..=55).collect::<Vec<_>>());

        let explore: Vec<usize> = tested
            .iter()
            .filter(|(p, _)| *p == SearchPhase::ExploratoryGrowth)
            .map(|(_, c)| *c)
            .collect();
        assert_eq!(explore, vec![550]);

        assert_eq!(strategy.best(), 50);
        assert_eq!(strategy.result(), 50);
        assert_eq!(strategy.termination(), Some(Termination::FailureBoundary));
    }

    #[test]
    fn test_fine_tune_last_acceptance_wins() {
        let mut strategy = SearchStrategy::new(SearchConfig::default(), 1_000);
        strategy.phase = SearchPhase::BinarySearch;
        strategy.best = 50;
        strategy.low = 1;
        strategy.high = 0;

        // Non-monotonic neighborhood: 53 fails, 54 passes, 55 fails.
        let mut scanned = Vec::new();
        while let Some(c) = strategy.next_concurrency() {
            if strategy.phase() != SearchPhase::LocalFineTune {
                break;
            }
            scanned.push(c);
            let pass = c <= 52 || c == 54;
            strategy.observe(c, &stats(c, pass, flat(c)), &thresholds());
        }

        assert_eq!(scanned, (45..=55).collect::<Vec<_>>());
        assert_eq!(strategy.best(), 54);
    }

    #[test]
    fn test_exploratory_step_grows_while_latency_flat() {
        let mut strategy = SearchStrategy::new(SearchConfig::default(), 100_000);
        let tested = drive(&mut strategy, 4_000, flat);

        let explore: Vec<usize> = tested
            .iter()
            .filter(|(p, _)| *p == SearchPhase::ExploratoryGrowth)
            .map(|(_, c)| *c)
            .collect();
        // best 505 after fine-tune, then +500, +1000, +2000.
        assert_eq!(explore, vec![1_005, 2_005, 4_005]);
        assert_eq!(strategy.result(), 2_005);
    }

    #[test]
    fn test_exploratory_step_halves_on_latency_growth() {
        let mut strategy = SearchStrategy::new(SearchConfig::default(), 100_000);
        // Latency jumps at every multiple of 500, halving the step there.
        let tested = drive(&mut strategy, 2_000, |c| {
            Duration::from_millis(10 * (c as u64 / 500).max(1).pow(2))
        });

        let explore: Vec<usize> = tested
            .iter()
            .filter(|(p, _)| *p == SearchPhase::ExploratoryGrowth)
            .map(|(_, c)| *c)
            .collect();
        assert_eq!(explore[0], 1_005);
        assert_eq!(explore[1], 1_255);
        assert!(strategy.step() >= 100);
        assert!(strategy.result() <= 2_000);
        assert!(strategy.result() + strategy.step() > 2_000);
    }

    #[test]
    fn test_ceiling_stops_growth() {
        let mut strategy = SearchStrategy::new(SearchConfig::default(), 3_000);
        let tested = drive(&mut strategy, 10_000, flat);

        // 4_005 would exceed the ceiling and is never tested.
        assert!(tested.iter().all(|(_, c)| *c <= 3_000));
        assert_eq!(strategy.termination(), Some(Termination::CeilingReached));
        assert_eq!(strategy.result(), 2_005);
    }

    #[test]
    fn test_huge_multiplier_stops_at_ceiling() {
        let config = SearchConfig {
            step_multiplier: 1e30,
            ..SearchConfig::default()
        };
        let mut strategy = SearchStrategy::new(config, 2_000);
        let tested = drive(&mut strategy, usize::MAX, flat);

        let explore: Vec<usize> = tested
            .iter()
            .filter(|(p, _)| *p == SearchPhase::ExploratoryGrowth)
            .map(|(_, c)| *c)
            .collect();
        assert_eq!(explore, vec![1_005]);
        assert_eq!(strategy.step(), 2_000);
        assert_eq!(strategy.result(), 1_005);
        assert_eq!(strategy.termination(), Some(Termination::CeilingReached));
    }

    #[test]
    fn test_nothing_accepted_is_exhausted() {
        let mut strategy = SearchStrategy::new(SearchConfig::default(), 1_000);
        let tested = drive(&mut strategy, 0, flat);

        assert_eq!(strategy.result(), 0);
        assert_eq!(strategy.termination(), Some(Termination::Exhausted));
        assert!(tested
            .iter()
            .all(|(p, _)| *p != SearchPhase::ExploratoryGrowth));
    }

    #[test]
    fn test_success_rate_must_exceed_floor() {
        let strategy = SearchStrategy::new(SearchConfig::default(), 1_000);
        let mut results = vec![
            ProbeResult::Success {
                latency: Duration::from_millis(5)
            };
            9
        ];
        results.push(ProbeResult::Failure(FailureKind::Timeout));
        let ninety = BatchStats::from_results(10, &results, Duration::from_secs(1));
        assert!(!strategy.accepts(&ninety, &thresholds()));

        let all = stats(10, true, Duration::from_millis(5));
        assert!(strategy.accepts(&all, &thresholds()));

        let slow = stats(10, true, Duration::from_secs(2));
        assert!(!strategy.accepts(&slow, &thresholds()));
    }
}
