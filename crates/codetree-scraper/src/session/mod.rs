//! The browser capability the crawler drives.
//!
//! Every component borrows one [`BrowserSession`] for the duration of a run.
//! The Chromium implementation lives in [`chrome`]; tests use the scripted
//! `FakeSession` from [`crate::testing`].

use std::time::Duration;

use crate::error::ScraperError;

#[cfg(feature = "browser")]
pub mod chrome;
pub mod devtools;
#[cfg(feature = "browser")]
mod stealth;

#[cfg(feature = "browser")]
pub use chrome::ChromeSession;
pub use devtools::resolve_devtools_ws_url;

/// Header swapped by blocked-page recovery.
pub const USER_AGENT_HEADER: &str = "User-Agent";

/// A single controllable browser page.
///
/// Methods take `&mut self` because a session processes exactly one
/// navigation at a time.
#[allow(async_fn_in_trait)]
pub trait BrowserSession {
    /// Handle to a DOM element on the current page. Handles are only valid
    /// until the next navigation or reload.
    type Element;

    /// Loads `url`, failing with [`ScraperError::NavigationTimeout`] when the
    /// page does not finish loading within `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), ScraperError>;

    /// Reloads the current page with the same timeout semantics as `navigate`.
    async fn reload(&mut self, timeout: Duration) -> Result<(), ScraperError>;

    async fn title(&mut self) -> Result<String, ScraperError>;

    /// All elements matching `selector`, in document order.
    async fn query(&mut self, selector: &str) -> Result<Vec<Self::Element>, ScraperError>;

    /// Descendants of `scope` matching `selector`, in document order.
    async fn query_within(
        &mut self,
        scope: &Self::Element,
        selector: &str,
    ) -> Result<Vec<Self::Element>, ScraperError>;

    async fn attribute(
        &mut self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, ScraperError>;

    async fn inner_text(&mut self, element: &Self::Element) -> Result<Option<String>, ScraperError>;

    async fn click(&mut self, element: &Self::Element) -> Result<(), ScraperError>;

    /// Clicks `element` and reads `attribute` from the first `selector` match
    /// in the page the click opens, or in the current page when nothing opens
    /// within `timeout` (an in-page modal). An opened page is closed again.
    async fn read_after_click(
        &mut self,
        element: &Self::Element,
        selector: &str,
        attribute: &str,
        timeout: Duration,
    ) -> Result<Option<String>, ScraperError>;

    /// Sets a request header for every subsequent navigation and reload.
    async fn set_header(&mut self, name: &str, value: &str) -> Result<(), ScraperError>;

    /// Scrolls to the bottom of the page so lazily rendered sections appear.
    async fn scroll_to_bottom(&mut self) -> Result<(), ScraperError>;
}

/// Trimmed inner text of the first descendant of `scope` matching `selector`.
///
/// Returns `Ok(None)` when nothing matches or the text is blank.
///
/// # Errors
///
/// Propagates session failures from the query or the text read.
pub async fn first_text<S: BrowserSession>(
    session: &mut S,
    scope: &S::Element,
    selector: &str,
) -> Result<Option<String>, ScraperError> {
    let matches = session.query_within(scope, selector).await?;
    let Some(first) = matches.first() else {
        return Ok(None);
    };
    Ok(session
        .inner_text(first)
        .await?
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty()))
}
