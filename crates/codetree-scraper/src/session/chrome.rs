//! Chromium implementation of [`BrowserSession`] over the DevTools protocol.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::browser_protocol::target::TargetId;
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
use codetree_core::AppConfig;
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::devtools::resolve_devtools_ws_url;
use super::stealth::{DEFAULT_HEADERS, INIT_SCRIPTS, LAUNCH_ARGS};
use super::{BrowserSession, USER_AGENT_HEADER};
use crate::error::ScraperError;

/// How to obtain the browser for a run.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub headless: bool,
    /// Attach to this DevTools endpoint instead of launching Chromium.
    pub remote_url: Option<String>,
    pub chrome_path: Option<PathBuf>,
    pub user_agent: String,
}

impl SessionConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            headless: config.headless,
            remote_url: config.browser_remote_url.clone(),
            chrome_path: config.chrome_path.clone(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// One Chromium page, acquired once per run.
///
/// Call [`ChromeSession::release`] on every exit path. Dropping an
/// unreleased session stops the protocol handler and lets the browser
/// process be killed, but skips the orderly shutdown.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    launched: bool,
    headers: BTreeMap<String, String>,
    released: bool,
}

impl ChromeSession {
    /// Launches (or attaches to) Chromium and opens a stealth-initialised page.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::SessionAcquisition`] if the browser cannot be
    /// started or reached, or the page cannot be prepared.
    pub async fn acquire(config: &SessionConfig) -> Result<Self, ScraperError> {
        let (browser, handler, launched) = match &config.remote_url {
            Some(remote) => {
                let (browser, handler) = connect(remote).await?;
                (browser, handler, false)
            }
            None => {
                let (browser, handler) = launch(config).await?;
                (browser, handler, true)
            }
        };
        let handler = spawn_handler(handler);

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(ScraperError::SessionAcquisition(format!(
                    "failed to open page: {e}"
                )));
            }
        };

        let mut session = Self {
            browser,
            page,
            handler,
            launched,
            headers: DEFAULT_HEADERS
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            released: false,
        };

        if let Err(e) = session.prepare_page(&config.user_agent).await {
            session.release().await;
            return Err(ScraperError::SessionAcquisition(format!(
                "failed to prepare page: {e}"
            )));
        }

        tracing::info!(launched, headless = config.headless, "browser session acquired");
        Ok(session)
    }

    async fn prepare_page(&mut self, user_agent: &str) -> Result<(), ScraperError> {
        for script in INIT_SCRIPTS {
            self.page
                .execute(AddScriptToEvaluateOnNewDocumentParams::new(*script))
                .await?;
        }
        self.page
            .execute(SetUserAgentOverrideParams::new(user_agent))
            .await?;
        self.push_headers().await
    }

    async fn push_headers(&mut self) -> Result<(), ScraperError> {
        let value = serde_json::to_value(&self.headers)
            .map_err(|e| ScraperError::Session(format!("invalid header map: {e}")))?;
        self.page
            .execute(SetExtraHttpHeadersParams::new(Headers::new(value)))
            .await?;
        Ok(())
    }

    /// Closes the page and, when this session launched the browser, the
    /// browser process. Failures are logged, never returned.
    pub async fn release(mut self) {
        self.shutdown().await;
    }

    async fn shutdown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = self.page.clone().close().await {
            tracing::debug!(error = %e, "page close failed during release");
        }
        if self.launched {
            if let Err(e) = self.browser.close().await {
                tracing::warn!(error = %e, "browser close failed");
            }
            if let Err(e) = self.browser.wait().await {
                tracing::warn!(error = %e, "waiting for browser exit failed");
            }
        }
        self.handler.abort();
        tracing::info!("browser session released");
    }

    /// A page opened after `known` was taken, polled until `timeout`.
    async fn wait_for_popup(
        &self,
        known: &[TargetId],
        timeout: Duration,
    ) -> Result<Option<Page>, ScraperError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let opened = self
                .browser
                .pages()
                .await?
                .into_iter()
                .find(|p| !known.contains(p.target_id()));
            if opened.is_some() || tokio::time::Instant::now() >= deadline {
                return Ok(opened);
            }
            tokio::time::sleep(POPUP_POLL).await;
        }
    }

    async fn current_url(&self) -> String {
        self.page.url().await.ok().flatten().unwrap_or_default()
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!("browser session dropped without release");
            self.handler.abort();
        }
    }
}

async fn launch(config: &SessionConfig) -> Result<(Browser, Handler), ScraperError> {
    let mut builder = BrowserConfig::builder().window_size(1920, 1080);
    if !config.headless {
        builder = builder.with_head();
    }
    if let Some(path) = &config.chrome_path {
        builder = builder.chrome_executable(path);
    }
    for arg in LAUNCH_ARGS {
        builder = builder.arg(*arg);
    }
    let browser_config = builder
        .build()
        .map_err(|e| ScraperError::SessionAcquisition(format!("invalid browser config: {e}")))?;

    tracing::info!(headless = config.headless, "launching browser");
    Browser::launch(browser_config)
        .await
        .map_err(|e| ScraperError::SessionAcquisition(format!("failed to launch browser: {e}")))
}

async fn connect(remote_url: &str) -> Result<(Browser, Handler), ScraperError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let ws_url = resolve_devtools_ws_url(&client, remote_url).await?;

    tracing::info!(url = %ws_url, "connecting to remote browser");
    Browser::connect(ws_url).await.map_err(|e| {
        ScraperError::SessionAcquisition(format!("failed to connect to remote browser: {e}"))
    })
}

fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    })
}

const POPUP_POLL: Duration = Duration::from_millis(250);

async fn first_attribute(
    found: &[Element],
    attribute: &str,
) -> Result<Option<String>, ScraperError> {
    match found.first() {
        Some(element) => Ok(element.attribute(attribute).await?),
        None => Ok(None),
    }
}

fn timed_out(url: String, timeout: Duration) -> ScraperError {
    ScraperError::NavigationTimeout {
        url,
        timeout_secs: timeout.as_secs(),
    }
}

impl BrowserSession for ChromeSession {
    type Element = Element;

    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), ScraperError> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(timed_out(url.to_owned(), timeout)),
        }
    }

    async fn reload(&mut self, timeout: Duration) -> Result<(), ScraperError> {
        match tokio::time::timeout(timeout, self.page.reload()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(timed_out(self.current_url().await, timeout)),
        }
    }

    async fn title(&mut self) -> Result<String, ScraperError> {
        Ok(self.page.get_title().await?.unwrap_or_default())
    }

    async fn query(&mut self, selector: &str) -> Result<Vec<Element>, ScraperError> {
        Ok(self.page.find_elements(selector).await?)
    }

    async fn query_within(
        &mut self,
        scope: &Element,
        selector: &str,
    ) -> Result<Vec<Element>, ScraperError> {
        Ok(scope.find_elements(selector).await?)
    }

    async fn attribute(
        &mut self,
        element: &Element,
        name: &str,
    ) -> Result<Option<String>, ScraperError> {
        Ok(element.attribute(name).await?)
    }

    async fn inner_text(&mut self, element: &Element) -> Result<Option<String>, ScraperError> {
        Ok(element.inner_text().await?)
    }

    async fn click(&mut self, element: &Element) -> Result<(), ScraperError> {
        element.click().await?;
        Ok(())
    }

    async fn read_after_click(
        &mut self,
        element: &Element,
        selector: &str,
        attribute: &str,
        timeout: Duration,
    ) -> Result<Option<String>, ScraperError> {
        let known: Vec<TargetId> = self
            .browser
            .pages()
            .await?
            .iter()
            .map(|p| p.target_id().clone())
            .collect();
        element.click().await?;

        let Some(popup) = self.wait_for_popup(&known, timeout).await? else {
            tracing::debug!(selector, "no popup opened, reading current page");
            let found = self.page.find_elements(selector).await?;
            return first_attribute(&found, attribute).await;
        };

        if tokio::time::timeout(timeout, popup.wait_for_navigation())
            .await
            .is_err()
        {
            tracing::debug!(selector, "popup still loading, reading it anyway");
        }
        let value = match popup.find_elements(selector).await {
            Ok(found) => first_attribute(&found, attribute).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = popup.close().await {
            tracing::debug!(error = %e, "popup close failed");
        }
        value
    }

    async fn set_header(&mut self, name: &str, value: &str) -> Result<(), ScraperError> {
        if name.eq_ignore_ascii_case(USER_AGENT_HEADER) {
            self.page
                .execute(SetUserAgentOverrideParams::new(value))
                .await?;
        }
        self.headers.insert(name.to_owned(), value.to_owned());
        self.push_headers().await
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), ScraperError> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)".to_string())
            .await?;
        Ok(())
    }
}
