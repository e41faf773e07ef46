//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Delay before retry number `attempt` (1-based).
///
/// Doubles from `base` on each attempt, capped at `max`, plus up to 10% jitter.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 2u32.saturating_pow(attempt - 1);
    let capped = base.saturating_mul(factor).min(max);

    let jitter_range = capped.as_millis() as u64 / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    capped + Duration::from_millis(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_then_caps() {
        let base = Duration::from_millis(100);
        let max = Duration::from_millis(1_000);

        assert_eq!(calculate_backoff(0, base, max), Duration::ZERO);

        let first = calculate_backoff(1, base, max);
        assert!(first >= base && first < Duration::from_millis(110));

        let second = calculate_backoff(2, base, max);
        assert!(second >= Duration::from_millis(200) && second < Duration::from_millis(220));

        let capped = calculate_backoff(12, base, max);
        assert!(capped >= max && capped < Duration::from_millis(1_100));
    }

    #[test]
    fn test_zero_base_has_no_jitter() {
        assert_eq!(
            calculate_backoff(3, Duration::ZERO, Duration::from_millis(50)),
            Duration::ZERO
        );
    }
}
