use serde::{Deserialize, Serialize};

use crate::category::{CategoryLevel, CategoryLink};

/// A coupon read from one block on a category page.
///
/// `button_index` is the block's zero-based position among the page's
/// coupon blocks at extraction time. It only identifies the block on a
/// freshly rendered copy of the same page, and only while the page keeps
/// its ordering. It is not a stable key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub brand: String,
    pub code: String,
    pub description: String,
    pub button_index: usize,
}

impl Coupon {
    /// Builds a coupon from raw field text, trimming each field.
    ///
    /// Returns the name of the first missing field when any of `brand`,
    /// `code`, or `description` is absent or blank after trimming.
    ///
    /// # Errors
    ///
    /// Returns `Err(field_name)` for an incomplete record.
    pub fn from_fields(
        brand: Option<&str>,
        code: Option<&str>,
        description: Option<&str>,
        button_index: usize,
    ) -> Result<Self, &'static str> {
        fn required(value: Option<&str>, field: &'static str) -> Result<String, &'static str> {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
                .ok_or(field)
        }

        Ok(Self {
            brand: required(brand, "brand")?,
            code: required(code, "code")?,
            description: required(description, "description")?,
            button_index,
        })
    }
}

/// A coupon annotated with the category page it was scraped from.
///
/// This is the record shape of the flat coupon artifacts. The tree builder
/// uses `category_path` to find the node the coupon belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedCoupon {
    #[serde(flatten)]
    pub coupon: Coupon,
    /// Display title of the source category.
    pub category: String,
    pub category_url: String,
    pub category_path: String,
    pub category_level: CategoryLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_category: Option<String>,
    #[serde(default)]
    pub level1: Option<String>,
    #[serde(default)]
    pub level2: Option<String>,
    #[serde(default)]
    pub level3: Option<String>,
}

impl ScrapedCoupon {
    /// Annotates `coupon` with `link`'s title, location, and slugs.
    #[must_use]
    pub fn from_link(coupon: Coupon, link: &CategoryLink) -> Self {
        let slugs = link.slugs();
        Self {
            coupon,
            category: link.title.clone(),
            category_url: link.url.clone(),
            category_path: link.path.clone(),
            category_level: link.level,
            parent_category: link.parent_label(),
            level1: slugs.as_ref().map(|s| s.level1.clone()),
            level2: slugs.as_ref().map(|s| s.level2.clone()),
            level3: slugs.and_then(|s| s.level3),
        }
    }
}
