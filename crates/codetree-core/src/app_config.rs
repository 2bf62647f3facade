use std::path::PathBuf;

/// Runtime settings for a crawl, resolved from `CODETREE_*` environment
/// variables by [`crate::load_app_config`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Site origin, e.g. `"https://simplycodes.com"`.
    pub base_url: String,
    /// Taxonomy root path, e.g. `"/category"`.
    pub category_root_path: String,
    pub data_dir: PathBuf,
    pub log_level: String,
    pub headless: bool,
    /// DevTools endpoint of an already-running browser. When set, the
    /// session connects instead of launching Chromium.
    pub browser_remote_url: Option<String>,
    pub chrome_path: Option<PathBuf>,
    pub user_agent: String,
    /// Identifying header swapped in when a page comes back blocked.
    pub fallback_user_agent: String,
    pub nav_timeout_secs: u64,
    pub max_attempts: u32,
    /// Retry delay step: attempt `n` waits `n * retry_delay_secs`.
    pub retry_delay_secs: u64,
    pub category_delay_secs: u64,
    pub settle_min_ms: u64,
    pub settle_max_ms: u64,
    pub recovery_min_ms: u64,
    pub recovery_max_ms: u64,
}

impl AppConfig {
    /// Absolute URL of the taxonomy root page.
    #[must_use]
    pub fn category_root_url(&self) -> String {
        crate::category::absolute_url(&self.base_url, &self.category_root_path)
    }
}
