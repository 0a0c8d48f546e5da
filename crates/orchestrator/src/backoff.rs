//! Randomized exponential backoff
//!
//! `delay = min(base * 2^attempt + U(0, 0.5 * base * 2^attempt), max)`.
//! Each failure class that waits before retrying carries its own
//! `BackoffPolicy`, so rate limits and server faults back off at different
//! magnitudes.

use std::time::Duration;

use rand::RngExt;
use serde::Deserialize;

/// Exponents above this are clamped; the result saturates at `max` long
/// before then for any sane base.
const MAX_EXPONENT: u32 = 32;

/// Compute a jittered exponential delay for the zero-based `attempt`.
///
/// The result lies in `[min(base * 2^attempt, max), max]`.
pub fn delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponential = base.as_secs_f64() * 2f64.powi(attempt.min(MAX_EXPONENT) as i32);
    let jitter = if exponential > 0.0 {
        rand::rng().random_range(0.0..=exponential * 0.5)
    } else {
        0.0
    };
    let total = (exponential + jitter).min(max.as_secs_f64());
    Duration::from_secs_f64(total.max(0.0))
}

/// A `(base, max)` pair for one failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BackoffPolicy {
    pub base_ms: u64,
    pub max_ms: u64,
}

impl BackoffPolicy {
    pub const fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    pub fn base(&self) -> Duration {
        Duration::from_millis(self.base_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        delay(attempt, self.base(), self.max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_stays_within_bounds() {
        let base = Duration::from_millis(500);
        let max = Duration::from_secs(20);
        for attempt in 0..10u32 {
            let floor = (base * 2u32.pow(attempt)).min(max);
            for _ in 0..200 {
                let d = delay(attempt, base, max);
                assert!(d >= floor, "attempt {attempt}: {d:?} < {floor:?}");
                assert!(d <= max, "attempt {attempt}: {d:?} > {max:?}");
            }
        }
    }

    #[test]
    fn jitter_is_at_most_half_the_exponential_term() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(3600);
        for _ in 0..200 {
            let d = delay(2, base, max);
            assert!(d >= Duration::from_secs(4));
            assert!(d <= Duration::from_secs(6));
        }
    }

    #[test]
    fn mean_delay_grows_with_attempt() {
        let policy = BackoffPolicy::new(100, 60_000);
        let mean = |attempt| {
            (0..500)
                .map(|_| policy.delay(attempt).as_secs_f64())
                .sum::<f64>()
                / 500.0
        };
        let means: Vec<f64> = (0..6).map(mean).collect();
        for pair in means.windows(2) {
            assert!(pair[1] >= pair[0], "means not increasing: {means:?}");
        }
    }

    #[test]
    fn huge_attempt_saturates_at_max() {
        let policy = BackoffPolicy::new(1000, 30_000);
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn zero_base_means_no_wait() {
        assert_eq!(delay(3, Duration::ZERO, Duration::from_secs(5)), Duration::ZERO);
    }
}
