//! Re-locating a previously extracted coupon on a fresh copy of its page.
//!
//! `button_index` is only meaningful for a freshly rendered page whose block
//! order has not changed, so validation always navigates anew and compares
//! the block found at that position with the stored record. A confirmed block
//! is then clicked through to the shop URL behind its "Copy code" button.

use std::time::Duration;

use codetree_core::Coupon;

use crate::error::ScraperError;
use crate::extract::CouponExtractor;
use crate::selectors::{COPY_CODE_LABEL, COUPON_BUTTON, SHOP_LINK};
use crate::session::BrowserSession;
use crate::settings::ScrapeSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The block at `button_index` carries the same brand, code and
    /// description. `shop_url` is the deal link behind its "Copy code"
    /// button, when one could be read.
    Confirmed { shop_url: Option<String> },
    /// The block exists but its fields differ.
    Mismatch { found: Coupon },
    /// The page has fewer blocks than `button_index + 1`.
    OutOfRange { blocks: usize },
    /// The block exists but one of its fields is missing.
    Incomplete { missing: &'static str },
    Blocked { title: String },
    Timeout,
    /// The page rendered without a coupon grid.
    NotFound,
    Failed(String),
}

impl Validation {
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    fn from_error(err: ScraperError) -> Self {
        match err {
            ScraperError::NavigationTimeout { .. } => Self::Timeout,
            ScraperError::BlockedPage { title, .. } => Self::Blocked { title },
            ScraperError::SelectorNotFound { .. } => Self::NotFound,
            ScraperError::IncompleteRecord { missing, .. } => Self::Incomplete { missing },
            other => Self::Failed(other.to_string()),
        }
    }
}

fn same_fields(a: &Coupon, b: &Coupon) -> bool {
    a.brand == b.brand && a.code == b.code && a.description == b.description
}

/// How long a click on "Copy code" may take to open its popup.
const POPUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Checks that `expected` is still found at its `button_index` on `url`.
///
/// Never writes anything; every failure becomes a [`Validation`] variant.
pub async fn validate_coupon<S: BrowserSession>(
    session: &mut S,
    settings: &ScrapeSettings,
    url: &str,
    expected: &Coupon,
) -> Validation {
    let mut extractor = CouponExtractor::new(session, settings);
    let result = locate(&mut extractor, url, expected.button_index).await;

    let validation = match result {
        Ok((found, block)) if same_fields(&found, expected) => Validation::Confirmed {
            shop_url: resolve_shop_url(session, &block).await,
        },
        Ok((found, _)) => Validation::Mismatch { found },
        Err(Located::OutOfRange(blocks)) => Validation::OutOfRange { blocks },
        Err(Located::Error(e)) => Validation::from_error(e),
    };
    tracing::info!(
        url,
        button_index = expected.button_index,
        code = %expected.code,
        confirmed = validation.is_confirmed(),
        "coupon validation finished"
    );
    validation
}

/// Clicks the block's "Copy code" button and reads the shop link from the
/// popup it opens. Failures are logged and yield `None`.
pub async fn resolve_shop_url<S: BrowserSession>(
    session: &mut S,
    block: &S::Element,
) -> Option<String> {
    match read_shop_url(session, block).await {
        Ok(shop_url) => shop_url,
        Err(e) => {
            tracing::warn!(error = %e, "could not resolve shop url");
            None
        }
    }
}

async fn read_shop_url<S: BrowserSession>(
    session: &mut S,
    block: &S::Element,
) -> Result<Option<String>, ScraperError> {
    let buttons = session.query_within(block, COUPON_BUTTON).await?;
    for button in &buttons {
        let label = session.inner_text(button).await?.unwrap_or_default();
        if label.to_lowercase().contains(COPY_CODE_LABEL) {
            let shop_url = session
                .read_after_click(button, SHOP_LINK, "href", POPUP_TIMEOUT)
                .await?;
            if shop_url.is_none() {
                tracing::warn!(selector = SHOP_LINK, "popup has no shop link");
            }
            return Ok(shop_url);
        }
    }
    tracing::warn!(buttons = buttons.len(), "copy code button not found");
    Ok(None)
}

enum Located {
    OutOfRange(usize),
    Error(ScraperError),
}

impl From<ScraperError> for Located {
    fn from(err: ScraperError) -> Self {
        Self::Error(err)
    }
}

async fn locate<S: BrowserSession>(
    extractor: &mut CouponExtractor<'_, S>,
    url: &str,
    button_index: usize,
) -> Result<(Coupon, S::Element), Located> {
    extractor.open(url).await?;
    let mut blocks = extractor.coupon_blocks().await?;
    if button_index >= blocks.len() {
        return Err(Located::OutOfRange(blocks.len()));
    }
    let block = blocks.swap_remove(button_index);
    let coupon = extractor.read_block(&block, button_index).await?;
    Ok((coupon, block))
}
