//! Reconnect backoff policy.
//!
//! Pure delay computation for the connection driver: base delay doubled per
//! consecutive failed attempt, multiplied by uniform jitter in `[0, 1)`, then
//! capped. Quick retries after transient drops, bounded reconnection storms
//! when a server stays down.
//!
//! The computed delay is `min(cap, jitter * base * 2^retry_count)`. With the
//! default base of 500ms and cap of 64s the un-jittered curve hits the cap at
//! the 8th attempt and stays there; retries themselves are unbounded.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default base delay before the first reconnect attempt.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Default upper bound on any computed delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(64_000);

/// Exponent clamp keeping `2^n` finite for unbounded retry counts.
///
/// Any exponent past this is already far beyond every reachable cap.
const MAX_EXPONENT: u32 = 32;

// ============================================================================
// BackoffPolicy
// ============================================================================

/// Delay policy for reconnection attempts.
///
/// Stateless and side-effect free; the connection driver owns the retry
/// counter and asks the policy for each wait.
///
/// # Example
///
/// ```
/// use hx_push::BackoffPolicy;
///
/// let policy = BackoffPolicy::default();
/// let delay = policy.delay(3);
/// assert!(delay <= policy.cap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay for attempt 0 before jitter.
    base: Duration,
    /// Upper bound on any computed delay.
    cap: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_DELAY,
            cap: DEFAULT_MAX_DELAY,
        }
    }
}

impl BackoffPolicy {
    /// Creates a policy with a custom base delay and cap.
    #[inline]
    #[must_use]
    pub const fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// Returns the base delay.
    #[inline]
    #[must_use]
    pub const fn base(&self) -> Duration {
        self.base
    }

    /// Returns the delay cap.
    #[inline]
    #[must_use]
    pub const fn cap(&self) -> Duration {
        self.cap
    }

    /// Computes the wait before reconnect attempt `retry_count`.
    ///
    /// Draws fresh uniform jitter from `[0, 1)`. The result is always finite
    /// and within `[0, cap]`.
    #[must_use]
    pub fn delay(&self, retry_count: u32) -> Duration {
        self.delay_with_jitter(retry_count, fastrand::f64())
    }

    /// Computes the delay with an explicit jitter factor.
    ///
    /// Jitter outside `[0, 1)` is clamped. Exposed so the growth curve is
    /// testable without a random source.
    #[must_use]
    pub fn delay_with_jitter(&self, retry_count: u32, jitter: f64) -> Duration {
        let jitter = if jitter.is_finite() {
            jitter.clamp(0.0, 1.0)
        } else {
            1.0
        };

        let exponent = retry_count.min(MAX_EXPONENT) as i32;
        let scaled = self.base.as_millis() as f64 * 2f64.powi(exponent);
        let jittered = scaled * jitter;
        let capped = jittered.min(self.cap.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_zero_jitter_is_zero_delay() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_with_jitter(0, 0.0), Duration::ZERO);
        assert_eq!(policy.delay_with_jitter(20, 0.0), Duration::ZERO);
    }

    #[test]
    fn test_full_jitter_curve() {
        let policy = BackoffPolicy::default();
        assert_eq!(
            policy.delay_with_jitter(0, 1.0),
            Duration::from_millis(500)
        );
        assert_eq!(
            policy.delay_with_jitter(1, 1.0),
            Duration::from_millis(1_000)
        );
        assert_eq!(
            policy.delay_with_jitter(6, 1.0),
            Duration::from_millis(32_000)
        );
        // cap reached
        assert_eq!(policy.delay_with_jitter(7, 1.0), DEFAULT_MAX_DELAY);
        assert_eq!(policy.delay_with_jitter(100, 1.0), DEFAULT_MAX_DELAY);
    }

    #[test]
    fn test_non_finite_jitter_clamped() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_with_jitter(7, f64::NAN), DEFAULT_MAX_DELAY);
        assert_eq!(
            policy.delay_with_jitter(0, f64::INFINITY),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_custom_policy() {
        let policy = BackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(policy.base(), Duration::from_millis(100));
        assert_eq!(
            policy.delay_with_jitter(3, 1.0),
            Duration::from_millis(800)
        );
        assert_eq!(policy.delay_with_jitter(4, 1.0), Duration::from_secs(1));
    }

    proptest! {
        #[test]
        fn prop_delay_within_bounds(retry in 0u32..10_000, jitter in 0.0f64..1.0) {
            let policy = BackoffPolicy::default();
            let delay = policy.delay_with_jitter(retry, jitter);
            prop_assert!(delay <= policy.cap());
        }

        #[test]
        fn prop_random_delay_within_bounds(retry in 0u32..10_000) {
            let policy = BackoffPolicy::default();
            let delay = policy.delay(retry);
            prop_assert!(delay <= policy.cap());
        }

        #[test]
        fn prop_monotone_for_fixed_jitter(retry in 0u32..64, jitter in 0.0f64..1.0) {
            let policy = BackoffPolicy::default();
            let current = policy.delay_with_jitter(retry, jitter);
            let next = policy.delay_with_jitter(retry + 1, jitter);
            prop_assert!(next >= current);
        }
    }
}
