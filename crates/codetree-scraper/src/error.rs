use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("navigation to {url} timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("blocked page at {url} (title \"{title}\")")]
    BlockedPage { url: String, title: String },

    #[error("selector matched nothing: {selector}")]
    SelectorNotFound { selector: String },

    #[error("coupon block {button_index} is missing its {missing}")]
    IncompleteRecord {
        button_index: usize,
        missing: &'static str,
    },

    #[error("browser session could not be acquired: {0}")]
    SessionAcquisition(String),

    #[cfg(feature = "browser")]
    #[error("browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("remote browser lookup failed: {0}")]
    RemoteBrowser(#[from] reqwest::Error),

    #[error("browser session error: {0}")]
    Session(String),
}
