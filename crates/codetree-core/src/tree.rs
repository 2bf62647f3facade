//! Three-level category tree and the pure builder that merges discovered
//! categories with scraped coupons.
//!
//! The serialized shape is the interchange format read by downstream
//! consumers:
//!
//! ```text
//! level1_slug -> { category_name, category_path, subcategories:
//!     level2_slug -> { subcategories_name, subcategories_path, url, coupons,
//!         subcategories?: level3_slug -> { subcategories_name, subcategories_path, url, coupons } } }
//! ```
//!
//! Every level is a `BTreeMap` keyed by slug, so serialization order is
//! stable and two builds from the same input compare equal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::{absolute_url, slug_to_title, CategoryLevel, CategoryLink, PathSlugs};
use crate::coupon::{Coupon, ScrapedCoupon};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTree {
    pub categories: BTreeMap<String, TopCategory>,
}

/// Level-1 node. Never owns coupons directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopCategory {
    pub category_name: String,
    pub category_path: String,
    #[serde(default)]
    pub subcategories: BTreeMap<String, Subcategory>,
}

/// Level-2 node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub subcategories_name: String,
    pub subcategories_path: String,
    pub url: String,
    #[serde(default)]
    pub coupons: Vec<Coupon>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subcategories: BTreeMap<String, LeafCategory>,
}

/// Level-3 node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafCategory {
    pub subcategories_name: String,
    pub subcategories_path: String,
    pub url: String,
    #[serde(default)]
    pub coupons: Vec<Coupon>,
}

impl CategoryTree {
    /// Number of level-1 categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Number of level-2 and level-3 nodes.
    #[must_use]
    pub fn subcategory_count(&self) -> usize {
        self.categories
            .values()
            .flat_map(|top| top.subcategories.values())
            .map(|sub| 1 + sub.subcategories.len())
            .sum()
    }

    /// Total coupons attached anywhere in the tree.
    #[must_use]
    pub fn coupon_count(&self) -> usize {
        self.categories
            .values()
            .flat_map(|top| top.subcategories.values())
            .map(|sub| {
                sub.coupons.len()
                    + sub
                        .subcategories
                        .values()
                        .map(|leaf| leaf.coupons.len())
                        .sum::<usize>()
            })
            .sum()
    }

    /// Coupon list of the node whose path is exactly `path`.
    #[must_use]
    pub fn coupons_at(&self, path: &str) -> Option<&[Coupon]> {
        let path = path.trim_end_matches('/');
        let slugs = PathSlugs::parse(path)?;
        let sub = self
            .categories
            .get(&slugs.level1)?
            .subcategories
            .get(&slugs.level2)?;
        match slugs.level3 {
            None => (sub.subcategories_path == path).then_some(sub.coupons.as_slice()),
            Some(level3) => {
                let leaf = sub.subcategories.get(&level3)?;
                (leaf.subcategories_path == path).then_some(leaf.coupons.as_slice())
            }
        }
    }

    fn coupons_at_mut(&mut self, path: &str) -> Option<&mut Vec<Coupon>> {
        let path = path.trim_end_matches('/');
        let slugs = PathSlugs::parse(path)?;
        let sub = self
            .categories
            .get_mut(&slugs.level1)?
            .subcategories
            .get_mut(&slugs.level2)?;
        match slugs.level3 {
            None => (sub.subcategories_path == path).then_some(&mut sub.coupons),
            Some(level3) => {
                let leaf = sub.subcategories.get_mut(&level3)?;
                (leaf.subcategories_path == path).then_some(&mut leaf.coupons)
            }
        }
    }

    fn top_mut(&mut self, slugs: &PathSlugs) -> &mut TopCategory {
        self.categories
            .entry(slugs.level1.clone())
            .or_insert_with(|| TopCategory {
                category_name: slug_to_title(&slugs.level1),
                category_path: slugs.level1_path(),
                subcategories: BTreeMap::new(),
            })
    }
}

/// Merges classified categories and category-annotated coupons into a tree.
///
/// Level-2 links are placed first, then level-3 links (synthesizing any
/// level-2 parent that was not discovered on its own), then coupons. A
/// coupon lands on the node whose path equals its `category_path`; coupons
/// with no such node are dropped. The function is pure: the same input
/// always yields an equal tree.
#[must_use]
pub fn build_tree(categories: &[CategoryLink], coupons: &[ScrapedCoupon]) -> CategoryTree {
    let mut tree = CategoryTree::default();

    for link in categories.iter().filter(|l| l.level == CategoryLevel::Two) {
        let Some(slugs) = link.slugs() else {
            tracing::debug!(path = %link.path, "skipping level-2 link with malformed path");
            continue;
        };
        let top = tree.top_mut(&slugs);
        let node = top
            .subcategories
            .entry(slugs.level2.clone())
            .or_insert_with(|| Subcategory {
                subcategories_name: String::new(),
                subcategories_path: String::new(),
                url: String::new(),
                coupons: Vec::new(),
                subcategories: BTreeMap::new(),
            });
        node.subcategories_name.clone_from(&link.title);
        node.subcategories_path.clone_from(&link.path);
        node.url.clone_from(&link.url);
    }

    for link in categories.iter().filter(|l| l.level == CategoryLevel::Three) {
        let Some(slugs) = link.slugs() else {
            tracing::debug!(path = %link.path, "skipping level-3 link with malformed path");
            continue;
        };
        let Some(level3) = slugs.level3.clone() else {
            continue;
        };
        let parent_url = sibling_url(link, &slugs.level2_path());
        let top = tree.top_mut(&slugs);
        let parent = top
            .subcategories
            .entry(slugs.level2.clone())
            .or_insert_with(|| Subcategory {
                subcategories_name: slug_to_title(&slugs.level2),
                subcategories_path: slugs.level2_path(),
                url: parent_url,
                coupons: Vec::new(),
                subcategories: BTreeMap::new(),
            });
        let replaced = parent.subcategories.insert(
            level3,
            LeafCategory {
                subcategories_name: link.title.clone(),
                subcategories_path: link.path.clone(),
                url: link.url.clone(),
                coupons: Vec::new(),
            },
        );
        // paths deeper than level 3 share the leaf key of their level-3 prefix
        if let Some(previous) = replaced {
            tracing::warn!(
                previous = %previous.subcategories_path,
                path = %link.path,
                "level-3 leaf replaced by a link with the same slugs"
            );
        }
    }

    let mut dropped = 0usize;
    for scraped in coupons {
        if let Some(list) = tree.coupons_at_mut(&scraped.category_path) {
            list.push(scraped.coupon.clone());
        } else {
            dropped += 1;
            tracing::debug!(
                category_path = %scraped.category_path,
                brand = %scraped.coupon.brand,
                "no tree node for coupon category; dropping"
            );
        }
    }
    if dropped > 0 {
        tracing::warn!(dropped, "coupons without a matching category node were dropped");
    }

    tree
}

/// URL for `path` on the same origin as `link`.
fn sibling_url(link: &CategoryLink, path: &str) -> String {
    match link.url.strip_suffix(link.path.as_str()) {
        Some(origin) => absolute_url(origin, path),
        None => link
            .url
            .rsplit_once('/')
            .map_or_else(|| path.to_owned(), |(parent, _)| parent.to_owned()),
    }
}

#[cfg(test)]
#[path = "tree_test.rs"]
mod tests;
