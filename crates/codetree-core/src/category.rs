//! Category links discovered from the taxonomy pages, and the path helpers
//! that classify them.
//!
//! A category path is site-relative and slash-delimited, e.g.
//! `"/category/beauty/makeup"`. Splitting on `/` yields a leading empty
//! segment, so that path has four segments and is a level-2 category.
//! Five or more segments make a level-3 category. Anything shallower is not
//! a category link at all.

use serde::{Deserialize, Serialize};

/// Depth of a discovered category in the site taxonomy.
///
/// Level 1 is implicit (the first slug under the taxonomy root) and never
/// appears as a link of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CategoryLevel {
    Two,
    Three,
}

impl CategoryLevel {
    /// Classifies a normalized path by its segment count.
    ///
    /// Returns `None` for paths with fewer than four segments.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        match segment_count(path) {
            4 => Some(Self::Two),
            n if n >= 5 => Some(Self::Three),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl From<CategoryLevel> for u8 {
    fn from(level: CategoryLevel) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for CategoryLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(format!("category level must be 2 or 3, got {other}")),
        }
    }
}

impl std::fmt::Display for CategoryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// A category or subcategory link found on the taxonomy root page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLink {
    /// Display text of the link, trimmed.
    pub title: String,
    /// Absolute URL of the category page.
    pub url: String,
    /// Site-relative path, e.g. `"/category/beauty/makeup"`.
    #[serde(alias = "category_path")]
    pub path: String,
    pub level: CategoryLevel,
    /// Path of the enclosing level-2 category. Only set for level-3 links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_path: Option<String>,
}

impl CategoryLink {
    /// Builds a link from raw anchor data.
    ///
    /// Returns `None` when the title is blank, the href points at another
    /// origin, or the path is too shallow to be a category.
    #[must_use]
    pub fn from_href(title: &str, href: &str, base_url: &str) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let path = normalize_path(href, base_url)?;
        let level = CategoryLevel::from_path(&path)?;
        let slugs = PathSlugs::parse(&path)?;
        let parent_path = match level {
            CategoryLevel::Two => None,
            CategoryLevel::Three => Some(slugs.level2_path()),
        };
        Some(Self {
            title: title.to_owned(),
            url: absolute_url(base_url, &path),
            path,
            level,
            parent_path,
        })
    }

    /// Slugs along this link's path, or `None` if the path is malformed.
    #[must_use]
    pub fn slugs(&self) -> Option<PathSlugs> {
        PathSlugs::parse(&self.path)
    }

    /// Human-readable parent label, e.g. `"beauty > makeup"` for a level-3
    /// link or `"beauty"` for a level-2 link.
    #[must_use]
    pub fn parent_label(&self) -> Option<String> {
        let slugs = self.slugs()?;
        Some(match self.level {
            CategoryLevel::Two => slugs.level1,
            CategoryLevel::Three => format!("{} > {}", slugs.level1, slugs.level2),
        })
    }
}

/// Slugs extracted from a category path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSlugs {
    /// Taxonomy root segment, e.g. `"category"`.
    pub root: String,
    pub level1: String,
    pub level2: String,
    pub level3: Option<String>,
}

impl PathSlugs {
    /// Splits a normalized path into its slugs.
    ///
    /// Requires at least `/{root}/{level1}/{level2}`; a fifth segment becomes
    /// `level3`. Empty segments are rejected.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let mut segments = path.split('/');
        if segments.next() != Some("") {
            return None;
        }
        let mut next_slug = || segments.next().filter(|s| !s.is_empty()).map(str::to_owned);
        let root = next_slug()?;
        let level1 = next_slug()?;
        let level2 = next_slug()?;
        let level3 = next_slug();
        Some(Self {
            root,
            level1,
            level2,
            level3,
        })
    }

    #[must_use]
    pub fn level1_path(&self) -> String {
        format!("/{}/{}", self.root, self.level1)
    }

    #[must_use]
    pub fn level2_path(&self) -> String {
        format!("/{}/{}/{}", self.root, self.level1, self.level2)
    }
}

/// Number of `/`-delimited segments, counting the leading empty one.
#[must_use]
pub fn segment_count(path: &str) -> usize {
    path.split('/').count()
}

/// Reduces an href to a site-relative path.
///
/// Same-origin absolute URLs are stripped to their path. Query strings,
/// fragments, and trailing slashes are dropped. Returns `None` for
/// foreign origins and for anything that is not a path.
#[must_use]
pub fn normalize_path(href: &str, base_url: &str) -> Option<String> {
    let href = href.trim();
    let base = base_url.trim_end_matches('/');

    let path = if let Some(rest) = href.strip_prefix(base) {
        if !(rest.is_empty() || rest.starts_with('/')) {
            return None;
        }
        rest
    } else if href.starts_with("http://") || href.starts_with("https://") || href.starts_with("//")
    {
        return None;
    } else {
        href
    };

    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');

    if !path.starts_with('/') {
        return None;
    }
    Some(path.to_owned())
}

/// Joins a site-relative path onto the site origin.
///
/// Absolute URLs are returned unchanged.
#[must_use]
pub fn absolute_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_owned();
    }
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Turns a slug into a display name: `"ai-content-creation"` becomes
/// `"Ai Content Creation"`.
#[must_use]
pub fn slug_to_title(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "category_test.rs"]
mod tests;
