//! Category discovery from the taxonomy root page.
//!
//! Discovery is best effort: every failure is logged and absorbed, and the
//! worst case is an empty list.

use codetree_core::{CategoryLevel, CategoryLink};

use crate::block::is_block_title;
use crate::error::ScraperError;
use crate::pacing::{pause, DelayRange};
use crate::selectors::{
    union_by_key, SelectorStrategy, LEVEL2_STRATEGIES, LEVEL3_STRATEGIES,
    SUBCATEGORY_STRATEGIES, TOGGLE_SELECTORS,
};
use crate::session::BrowserSession;
use crate::settings::ScrapeSettings;

/// An anchor as found on the page, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawLink {
    href: String,
    title: String,
}

pub struct CategoryDiscoverer<'a, S: BrowserSession> {
    session: &'a mut S,
    settings: &'a ScrapeSettings,
}

impl<'a, S: BrowserSession> CategoryDiscoverer<'a, S> {
    pub fn new(session: &'a mut S, settings: &'a ScrapeSettings) -> Self {
        Self { session, settings }
    }

    /// Level-2 and level-3 categories linked from the taxonomy root, level-2
    /// links first, each path at most once.
    ///
    /// Navigates afresh on every call. Returns an empty list when the root
    /// cannot be loaded or is a block page.
    pub async fn discover(&mut self) -> Vec<CategoryLink> {
        let root = self.settings.category_root_url.clone();
        tracing::info!(url = %root, "discovering categories");
        if !self.open(&root).await {
            return Vec::new();
        }

        let level2 = self.harvest(LEVEL2_STRATEGIES).await;
        self.expand_sections().await;
        let level3 = self.harvest(LEVEL3_STRATEGIES).await;

        let raw = union_by_key([level2, level3], |link| link.href.clone());
        let categories = self.classify(raw);

        let level3_count = categories
            .iter()
            .filter(|c| c.level == CategoryLevel::Three)
            .count();
        tracing::info!(
            total = categories.len(),
            level2 = categories.len() - level3_count,
            level3 = level3_count,
            "category discovery finished"
        );
        categories
    }

    /// Level-3 categories linked from one category page, excluding the page
    /// itself. Returns an empty list on any page-level failure.
    pub async fn discover_subcategories(&mut self, parent: &CategoryLink) -> Vec<CategoryLink> {
        tracing::info!(category = %parent.title, url = %parent.url, "exploring subcategories");
        if !self.open(&parent.url).await {
            return Vec::new();
        }

        let raw = self.harvest(SUBCATEGORY_STRATEGIES).await;
        let subcategories: Vec<_> = self
            .classify(raw)
            .into_iter()
            .filter(|c| c.level == CategoryLevel::Three && c.path != parent.path)
            .collect();

        tracing::info!(
            category = %parent.title,
            found = subcategories.len(),
            "subcategory exploration finished"
        );
        subcategories
    }

    /// [`discover`](Self::discover) followed by
    /// [`discover_subcategories`](Self::discover_subcategories) for every
    /// level-2 result, pausing `between` pages. New paths are appended in
    /// discovery order.
    pub async fn discover_deep(&mut self, between: DelayRange) -> Vec<CategoryLink> {
        let top = self.discover().await;
        let parents: Vec<_> = top
            .iter()
            .filter(|c| c.level == CategoryLevel::Two)
            .cloned()
            .collect();

        let mut batches = vec![top];
        for parent in &parents {
            pause(between).await;
            batches.push(self.discover_subcategories(parent).await);
        }

        let merged = union_by_key(batches, |c| c.path.clone());
        tracing::info!(total = merged.len(), "deep discovery finished");
        merged
    }

    /// Navigates and checks for a block page. Failures are logged.
    async fn open(&mut self, url: &str) -> bool {
        if let Err(e) = self.session.navigate(url, self.settings.nav_timeout).await {
            tracing::warn!(url, error = %e, "navigation failed");
            return false;
        }
        pause(self.settings.settle).await;

        match self.session.title().await {
            Ok(title) if is_block_title(&title) => {
                tracing::warn!(url, title = %title, "page blocked, skipping");
                false
            }
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(url, error = %e, "could not read page title");
                false
            }
        }
    }

    /// Runs every strategy and merges their links by `href`.
    async fn harvest(&mut self, strategies: &[SelectorStrategy]) -> Vec<RawLink> {
        let mut batches = Vec::with_capacity(strategies.len());
        for strategy in strategies {
            match self.run_strategy(strategy).await {
                Ok(elements) => {
                    tracing::debug!(
                        selector = %strategy.describe(),
                        matches = elements.len(),
                        "selector strategy matched"
                    );
                    batches.push(self.read_links(&elements).await);
                }
                Err(e) => {
                    tracing::warn!(strategy = strategy.name, error = %e, "selector strategy failed");
                }
            }
        }
        union_by_key(batches, |link| link.href.clone())
    }

    async fn run_strategy(
        &mut self,
        strategy: &SelectorStrategy,
    ) -> Result<Vec<S::Element>, ScraperError> {
        let Some((first, rest)) = strategy.chain.split_first() else {
            return Ok(Vec::new());
        };
        let mut current = self.session.query(first).await?;
        for selector in rest {
            let mut next = Vec::new();
            for scope in &current {
                next.extend(self.session.query_within(scope, selector).await?);
            }
            current = next;
        }
        Ok(current)
    }

    async fn read_links(&mut self, elements: &[S::Element]) -> Vec<RawLink> {
        let mut links = Vec::with_capacity(elements.len());
        for element in elements {
            match self.read_link(element).await {
                Ok(Some(link)) => links.push(link),
                Ok(None) => {}
                Err(e) => tracing::debug!(error = %e, "skipping unreadable link"),
            }
        }
        links
    }

    async fn read_link(&mut self, element: &S::Element) -> Result<Option<RawLink>, ScraperError> {
        let Some(href) = self.session.attribute(element, "href").await? else {
            return Ok(None);
        };
        let title = self
            .session
            .inner_text(element)
            .await?
            .map(|t| t.trim().to_owned())
            .unwrap_or_default();
        if href.trim().is_empty() || title.is_empty() {
            return Ok(None);
        }
        Ok(Some(RawLink {
            href: href.trim().to_owned(),
            title,
        }))
    }

    /// Scrolls to trigger lazy rendering, then clicks every closed toggle.
    async fn expand_sections(&mut self) {
        if let Err(e) = self.session.scroll_to_bottom().await {
            tracing::debug!(error = %e, "scroll failed");
        }

        let mut clicked = 0usize;
        for selector in TOGGLE_SELECTORS {
            let toggles = match self.session.query(selector).await {
                Ok(toggles) => toggles,
                Err(e) => {
                    tracing::debug!(selector, error = %e, "toggle query failed");
                    continue;
                }
            };
            tracing::debug!(selector, matches = toggles.len(), "toggles found");
            for toggle in &toggles {
                match self.session.click(toggle).await {
                    Ok(()) => clicked += 1,
                    Err(e) => tracing::debug!(selector, error = %e, "toggle click failed"),
                }
            }
        }

        tracing::debug!(clicked, "collapsible sections expanded");
        if clicked > 0 {
            pause(self.settings.settle).await;
        }
    }

    /// Keeps same-site links at level 2 or 3, first occurrence per path.
    fn classify(&self, raw: Vec<RawLink>) -> Vec<CategoryLink> {
        let links = raw.into_iter().filter_map(|link| {
            let classified = CategoryLink::from_href(&link.title, &link.href, &self.settings.base_url);
            if classified.is_none() {
                tracing::debug!(href = %link.href, "not a level-2/3 category link");
            }
            classified
        });
        union_by_key([links.collect::<Vec<_>>()], |c| c.path.clone())
    }
}

#[cfg(test)]
#[path = "discover_test.rs"]
mod tests;
