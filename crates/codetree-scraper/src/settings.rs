use std::time::Duration;

use codetree_core::{AppConfig, DEFAULT_FALLBACK_USER_AGENT};

use crate::pacing::DelayRange;
use crate::retry::RetryPolicy;

/// Timing and identity knobs shared by discovery, extraction and the
/// category loop.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub base_url: String,
    pub category_root_url: String,
    pub nav_timeout: Duration,
    /// Pause after every navigation.
    pub settle: DelayRange,
    /// Pause after the recovery reload.
    pub recovery_settle: DelayRange,
    pub fallback_user_agent: String,
    pub retry: RetryPolicy,
    /// Pause between successive category scrapes.
    pub category_delay: DelayRange,
}

impl ScrapeSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let category_ms = config.category_delay_secs.saturating_mul(1000);
        Self {
            base_url: config.base_url.clone(),
            category_root_url: config.category_root_url(),
            nav_timeout: Duration::from_secs(config.nav_timeout_secs),
            settle: DelayRange::from_millis(config.settle_min_ms, config.settle_max_ms),
            recovery_settle: DelayRange::from_millis(config.recovery_min_ms, config.recovery_max_ms),
            fallback_user_agent: config.fallback_user_agent.clone(),
            retry: RetryPolicy::new(
                config.max_attempts,
                Duration::from_secs(config.retry_delay_secs),
            ),
            // up to 50% jitter on top of the configured pause
            category_delay: DelayRange::from_millis(category_ms, category_ms.saturating_mul(3) / 2),
        }
    }

    /// Settings with every pause set to zero, for driving a scripted session.
    #[must_use]
    pub fn immediate(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_owned();
        Self {
            category_root_url: format!("{base_url}/category"),
            base_url,
            nav_timeout: Duration::from_secs(30),
            settle: DelayRange::ZERO,
            recovery_settle: DelayRange::ZERO,
            fallback_user_agent: DEFAULT_FALLBACK_USER_AGENT.to_owned(),
            retry: RetryPolicy::new(3, Duration::ZERO),
            category_delay: DelayRange::ZERO,
        }
    }
}
