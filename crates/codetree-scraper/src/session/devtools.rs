use serde::Deserialize;

use crate::error::ScraperError;

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: Option<String>,
}

/// Resolves the browser-level WebSocket endpoint of a running Chromium.
///
/// `remote_url` may be an `http(s)://` or `ws(s)://` DevTools address; the
/// endpoint is read from `{remote_url}/json/version`.
///
/// # Errors
///
/// Returns [`ScraperError::RemoteBrowser`] when the request fails and
/// [`ScraperError::SessionAcquisition`] when the response carries no
/// `webSocketDebuggerUrl`.
pub async fn resolve_devtools_ws_url(
    client: &reqwest::Client,
    remote_url: &str,
) -> Result<String, ScraperError> {
    let http_url = remote_url
        .replacen("ws://", "http://", 1)
        .replacen("wss://", "https://", 1);
    let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

    tracing::debug!(url = %version_url, "querying DevTools version endpoint");
    let info: VersionInfo = client
        .get(&version_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    info.web_socket_debugger_url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            ScraperError::SessionAcquisition(format!(
                "no webSocketDebuggerUrl in response from {version_url}"
            ))
        })
}
