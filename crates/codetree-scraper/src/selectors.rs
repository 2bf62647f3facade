//! Ranked DOM query strategies and the union-and-dedupe merge applied to
//! their results.
//!
//! The site's markup is matched by several independent strategies for the
//! same visual element. Every strategy runs; their matches are concatenated
//! in rank order and collapsed by key, first occurrence wins.

use std::collections::HashSet;
use std::hash::Hash;

/// A chain of selectors: the first is queried on the page, each later one
/// within the previous step's matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorStrategy {
    pub name: &'static str,
    pub chain: &'static [&'static str],
}

impl SelectorStrategy {
    #[must_use]
    pub const fn new(name: &'static str, chain: &'static [&'static str]) -> Self {
        Self { name, chain }
    }

    /// The chain joined as one descendant selector, for logging.
    #[must_use]
    pub fn describe(&self) -> String {
        self.chain.join(" >> ")
    }
}

/// Level-2 links on the taxonomy root page.
pub const LEVEL2_STRATEGIES: &[SelectorStrategy] = &[
    SelectorStrategy::new(
        "category-card-title",
        &["div.flex.flex-row.items-center.justify-between.rounded-16 div.title a"],
    ),
    SelectorStrategy::new("category-href", &[r#"a[href*="/category/"]"#]),
    SelectorStrategy::new(
        "category-class",
        &[r#"div[class*="category"] a, div[class*="rounded"] a"#],
    ),
];

/// Level-3 links nested under level-2 sections on the taxonomy root page,
/// read after collapsible sections have been expanded.
pub const LEVEL3_STRATEGIES: &[SelectorStrategy] = &[
    SelectorStrategy::new(
        "collapsible-list",
        &["div.overflow-hidden", "ul.ml-6.gap-4.flex.flex-col.pb-12", "li", "a"],
    ),
    SelectorStrategy::new(
        "open-section",
        &[r#"div[data-state="open"] ul a[href*="/category/"]"#],
    ),
];

/// Links on a single level-2 category page, most specific first.
pub const SUBCATEGORY_STRATEGIES: &[SelectorStrategy] = &[
    SelectorStrategy::new("list-item", &[r#"li a[href*="/category/"]"#]),
    SelectorStrategy::new("nested-list", &[r#"ul.ml-6 a[href*="/category/"]"#]),
    SelectorStrategy::new(
        "subcategory-class",
        &[r#"a.body-2.text-gray-30[href*="/category/"]"#],
    ),
    SelectorStrategy::new(
        "open-section",
        &[r#"div[data-state="open"] ul a[href*="/category/"]"#],
    ),
    SelectorStrategy::new("category-href", &[r#"a[href*="/category/"]"#]),
    SelectorStrategy::new("category-prefix", &[r#"a[href^="/category/"]"#]),
];

/// Inactive collapsible toggles to click before reading level-3 links.
pub const TOGGLE_SELECTORS: &[&str] = &[r#"button[data-state="closed"]"#, r#"[aria-expanded="false"]"#];

pub const COUPON_GRID: &str = "div.grid.grid-cols-1";
pub const COUPON_BLOCK: &str = "div[role='button']";
pub const COUPON_BRAND: &str = "h3";
pub const COUPON_CODE: &str = "button span.uppercase.truncate";
pub const COUPON_DESCRIPTION: &str = "h4";

/// Buttons of a coupon block; the one whose label contains
/// [`COPY_CODE_LABEL`] opens the deal.
pub const COUPON_BUTTON: &str = "button";
pub const COPY_CODE_LABEL: &str = "copy code";
/// Outbound shop link in the deal popup.
pub const SHOP_LINK: &str = "footer.modal-footer a";

/// Concatenates `batches` in order and keeps the first item for each key.
pub fn union_by_key<T, K, F>(batches: impl IntoIterator<Item = Vec<T>>, mut key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    batches
        .into_iter()
        .flatten()
        .filter(|item| seen.insert(key(item)))
        .collect()
}
