use std::time::Duration;

use rand::Rng;

/// Inclusive bounds for a jittered pause, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DelayRange {
    min_ms: u64,
    max_ms: u64,
}

impl DelayRange {
    pub const ZERO: Self = Self {
        min_ms: 0,
        max_ms: 0,
    };

    /// Reversed bounds are swapped.
    #[must_use]
    pub fn from_millis(a: u64, b: u64) -> Self {
        Self {
            min_ms: a.min(b),
            max_ms: a.max(b),
        }
    }

    #[must_use]
    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    #[must_use]
    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }

    /// A uniformly random duration within the bounds.
    #[must_use]
    pub fn sample(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return self.min();
        }
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }
}

/// Sleeps for a random duration drawn from `range`.
pub async fn pause(range: DelayRange) {
    let delay = range.sample();
    if delay.is_zero() {
        return;
    }
    tracing::debug!(delay_ms = delay.as_millis(), "pausing");
    tokio::time::sleep(delay).await;
}
