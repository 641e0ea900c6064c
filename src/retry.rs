//! Bounded polling and retry schedules with exponential backoff

use std::time::Duration;

/// Schedule for a bounded sequence of attempts
///
/// The first attempt waits `initial_delay`. Attempt `n` (zero-based, after
/// the first) waits `min(base_delay * 2^(n-1), max_delay)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first attempt
    pub initial_delay: Duration,
    /// Delay before the second attempt (doubles each attempt after)
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy with no waiting at all, for tests and local tooling
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Whether `attempt` (zero-based) is the last one allowed
    #[must_use]
    pub const fn is_final(&self, attempt: u32) -> bool {
        attempt + 1 >= self.max_attempts
    }
}

/// Compute the delay to wait before attempt number `attempt` (zero-based)
#[must_use]
pub fn delay_for_attempt(policy: &RetryPolicy, attempt: u32) -> Duration {
    if attempt == 0 {
        return policy.initial_delay;
    }

    policy
        .base_delay
        .saturating_mul(2u32.saturating_pow(attempt - 1))
        .min(policy.max_delay)
}

/// Sleep for the scheduled delay of `attempt`, skipping zero-length waits
pub async fn wait_for_attempt(policy: &RetryPolicy, attempt: u32) {
    let delay = delay_for_attempt(policy, attempt);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
