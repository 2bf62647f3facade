//! Bounded retries driven by page emptiness.
//!
//! A scrape is retried whenever it produces no coupons, whatever the cause.
//! A category that really has zero coupons therefore costs the full
//! `max_attempts` navigations.

use std::time::Duration;

use crate::outcome::PageOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never less than 1.
    pub max_attempts: u32,
    /// Attempt `n` (1-based) that comes back empty waits `n * delay_step`.
    pub delay_step: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, delay_step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay_step,
        }
    }

    /// One attempt, no waiting.
    #[must_use]
    pub fn single() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Wait after the empty attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.delay_step.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

/// Final outcome of a retried scrape and how many attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryReport {
    pub outcome: PageOutcome,
    pub attempts: u32,
}

/// Runs `attempt` until it yields coupons or the policy is exhausted.
///
/// `attempt` receives the 1-based attempt number. There is no wait after the
/// last attempt. The returned outcome is the last one observed.
pub async fn retry_until_nonempty<F>(policy: &RetryPolicy, mut attempt: F) -> RetryReport
where
    F: AsyncFnMut(u32) -> PageOutcome,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut number = 1u32;
    loop {
        tracing::debug!(attempt = number, max_attempts, "scrape attempt");
        let outcome = attempt(number).await;
        if outcome.has_coupons() || number >= max_attempts {
            if !outcome.has_coupons() {
                tracing::warn!(
                    attempts = number,
                    outcome = %outcome.kind(),
                    "all retry attempts came back empty"
                );
            }
            return RetryReport {
                outcome,
                attempts: number,
            };
        }

        let delay = policy.delay_after(number);
        tracing::warn!(
            attempt = number,
            max_attempts,
            delay_secs = delay.as_secs(),
            outcome = %outcome.kind(),
            "no coupons, retrying after delay"
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        number += 1;
    }
}
