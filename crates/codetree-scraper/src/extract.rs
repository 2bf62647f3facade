//! Coupon extraction from one category page, with blocked-page recovery.

use codetree_core::Coupon;

use crate::block::is_block_title;
use crate::error::ScraperError;
use crate::outcome::PageOutcome;
use crate::pacing::pause;
use crate::retry::{retry_until_nonempty, RetryPolicy, RetryReport};
use crate::selectors::{COUPON_BLOCK, COUPON_BRAND, COUPON_CODE, COUPON_DESCRIPTION, COUPON_GRID};
use crate::session::{first_text, BrowserSession, USER_AGENT_HEADER};
use crate::settings::ScrapeSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecoveryState {
    Normal,
    /// The fallback header has been sent and the page reloaded once.
    Recovering,
}

/// Reads coupons through a borrowed session.
pub struct CouponExtractor<'a, S: BrowserSession> {
    session: &'a mut S,
    settings: &'a ScrapeSettings,
}

impl<'a, S: BrowserSession> CouponExtractor<'a, S> {
    pub fn new(session: &'a mut S, settings: &'a ScrapeSettings) -> Self {
        Self { session, settings }
    }

    /// Navigates to `url`, waits for it to settle and gets past a block page
    /// if one is served.
    ///
    /// A block signal triggers one swap of the `User-Agent` header followed by
    /// a reload. The swapped header stays in effect for later navigations.
    ///
    /// # Errors
    ///
    /// [`ScraperError::NavigationTimeout`] if the page (or the recovery
    /// reload) does not load in time, [`ScraperError::BlockedPage`] if the
    /// page is still blocked after recovery, or any session failure.
    pub async fn open(&mut self, url: &str) -> Result<(), ScraperError> {
        tracing::info!(url, "navigating");
        self.session.navigate(url, self.settings.nav_timeout).await?;
        pause(self.settings.settle).await;

        let mut state = RecoveryState::Normal;
        loop {
            let title = self.session.title().await?;
            tracing::debug!(url, title = %title, "page loaded");
            if !is_block_title(&title) {
                if state == RecoveryState::Recovering {
                    tracing::info!(url, "block lifted after header swap");
                }
                return Ok(());
            }

            match state {
                RecoveryState::Normal => {
                    tracing::warn!(url, title = %title, "blocked page detected, swapping user agent");
                    self.session
                        .set_header(USER_AGENT_HEADER, &self.settings.fallback_user_agent)
                        .await?;
                    self.session.reload(self.settings.nav_timeout).await?;
                    pause(self.settings.recovery_settle).await;
                    state = RecoveryState::Recovering;
                }
                RecoveryState::Recovering => {
                    tracing::warn!(url, title = %title, "still blocked after recovery attempt");
                    return Err(ScraperError::BlockedPage {
                        url: url.to_owned(),
                        title,
                    });
                }
            }
        }
    }

    /// Coupon blocks of the loaded page, in DOM order.
    ///
    /// # Errors
    ///
    /// [`ScraperError::SelectorNotFound`] when the page has no coupon grid.
    pub async fn coupon_blocks(&mut self) -> Result<Vec<S::Element>, ScraperError> {
        let grids = self.session.query(COUPON_GRID).await?;
        let Some(grid) = grids.first() else {
            return Err(ScraperError::SelectorNotFound {
                selector: COUPON_GRID.to_owned(),
            });
        };
        self.session.query_within(grid, COUPON_BLOCK).await
    }

    /// Reads the three coupon fields of one block.
    ///
    /// # Errors
    ///
    /// [`ScraperError::IncompleteRecord`] when a field is absent or blank.
    pub async fn read_block(
        &mut self,
        block: &S::Element,
        button_index: usize,
    ) -> Result<Coupon, ScraperError> {
        let brand = first_text(&mut *self.session, block, COUPON_BRAND).await?;
        let code = first_text(&mut *self.session, block, COUPON_CODE).await?;
        let description = first_text(&mut *self.session, block, COUPON_DESCRIPTION).await?;

        Coupon::from_fields(
            brand.as_deref(),
            code.as_deref(),
            description.as_deref(),
            button_index,
        )
        .map_err(|missing| ScraperError::IncompleteRecord {
            button_index,
            missing,
        })
    }

    /// Reads every complete coupon on the loaded page.
    ///
    /// Incomplete blocks are skipped without renumbering the others, so
    /// `button_index` values in the result can have gaps.
    pub async fn read_coupons(&mut self) -> PageOutcome {
        let blocks = match self.coupon_blocks().await {
            Ok(blocks) => blocks,
            Err(e) => {
                tracing::warn!(error = %e, "no coupon grid on page");
                return PageOutcome::from_error(e);
            }
        };
        tracing::debug!(selector = COUPON_BLOCK, matches = blocks.len(), "coupon blocks found");

        let mut coupons = Vec::with_capacity(blocks.len());
        for (index, block) in blocks.iter().enumerate() {
            match self.read_block(block, index).await {
                Ok(coupon) => coupons.push(coupon),
                Err(e @ ScraperError::IncompleteRecord { .. }) => {
                    tracing::debug!(error = %e, "skipping incomplete coupon block");
                }
                Err(e) => {
                    tracing::warn!(button_index = index, error = %e, "failed to read coupon block");
                }
            }
        }
        PageOutcome::Coupons(coupons)
    }

    /// Opens `url` and reads its coupons.
    pub async fn extract(&mut self, url: &str) -> PageOutcome {
        let outcome = match self.open(url).await {
            Ok(()) => self.read_coupons().await,
            Err(e) => {
                tracing::warn!(url, error = %e, "could not open category page");
                PageOutcome::from_error(e)
            }
        };
        tracing::info!(url, outcome = %outcome.kind(), coupons = outcome.coupon_count(), "page scraped");
        outcome
    }

    /// [`CouponExtractor::extract`] under `policy`, retrying empty results.
    pub async fn scrape_with_retry(&mut self, url: &str, policy: &RetryPolicy) -> RetryReport {
        retry_until_nonempty(policy, async |attempt| {
            tracing::debug!(url, attempt, "extracting");
            self.extract(url).await
        })
        .await
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
