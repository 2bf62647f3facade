use codetree_core::{CategoryLink, ScrapedCoupon};

use crate::extract::CouponExtractor;
use crate::outcome::OutcomeKind;
use crate::pacing::pause;
use crate::session::BrowserSession;
use crate::settings::ScrapeSettings;

/// Per-outcome counters for a category loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryStats {
    pub processed: usize,
    pub succeeded: usize,
    pub empty: usize,
    pub blocked: usize,
    pub timed_out: usize,
    pub failed: usize,
    pub coupons: usize,
}

impl CategoryStats {
    fn record(&mut self, kind: OutcomeKind, coupons: usize) {
        self.processed += 1;
        self.coupons += coupons;
        match kind {
            OutcomeKind::Succeeded => self.succeeded += 1,
            OutcomeKind::Empty => self.empty += 1,
            OutcomeKind::Blocked => self.blocked += 1,
            OutcomeKind::TimedOut => self.timed_out += 1,
            OutcomeKind::Failed => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryRun {
    /// Every coupon found, annotated with its source category, in
    /// category order and then page order.
    pub coupons: Vec<ScrapedCoupon>,
    pub stats: CategoryStats,
}

/// Scrapes `categories` one after another through the retry coordinator.
///
/// A category that fails is counted and skipped; the loop always runs to the
/// end. `settings.category_delay` separates successive categories.
pub async fn scrape_categories<S: BrowserSession>(
    session: &mut S,
    settings: &ScrapeSettings,
    categories: &[CategoryLink],
) -> CategoryRun {
    let total = categories.len();
    let mut run = CategoryRun::default();
    let mut extractor = CouponExtractor::new(session, settings);

    for (position, category) in categories.iter().enumerate() {
        tracing::info!(
            category = %category.title,
            level = %category.level,
            url = %category.url,
            index = position + 1,
            total,
            "processing category"
        );

        let report = extractor
            .scrape_with_retry(&category.url, &settings.retry)
            .await;
        let kind = report.outcome.kind();
        let found = report.outcome.coupon_count();
        run.stats.record(kind, found);

        match kind {
            OutcomeKind::Succeeded => {
                tracing::info!(category = %category.title, coupons = found, "category scraped");
            }
            OutcomeKind::Empty => {
                tracing::warn!(category = %category.title, "no coupons found");
            }
            OutcomeKind::Blocked | OutcomeKind::TimedOut | OutcomeKind::Failed => {
                tracing::warn!(
                    category = %category.title,
                    attempts = report.attempts,
                    outcome = %kind,
                    "category skipped"
                );
            }
        }

        run.coupons.extend(
            report
                .outcome
                .into_coupons()
                .into_iter()
                .map(|coupon| ScrapedCoupon::from_link(coupon, category)),
        );

        if position + 1 < total {
            pause(settings.category_delay).await;
        }
    }

    tracing::info!(
        processed = run.stats.processed,
        succeeded = run.stats.succeeded,
        coupons = run.stats.coupons,
        "category loop finished"
    );
    run
}
