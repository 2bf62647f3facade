use anyhow::Context;
use codetree_core::AppConfig;
use codetree_scraper::{ChromeSession, SessionConfig};

/// Acquires the one browser session a command runs against.
///
/// Callers release it with [`ChromeSession::release`] before touching the
/// data directory, so a failed write never leaves a browser behind.
pub(crate) async fn acquire(config: &AppConfig) -> anyhow::Result<ChromeSession> {
    let session_config = SessionConfig::from_app_config(config);
    tracing::info!(
        headless = session_config.headless,
        remote = session_config.remote_url.is_some(),
        "acquiring browser session"
    );
    ChromeSession::acquire(&session_config)
        .await
        .context("failed to acquire browser session")
}
