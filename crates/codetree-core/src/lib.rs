pub mod app_config;
pub mod category;
pub mod config;
pub mod coupon;
pub mod store;
pub mod tree;

pub use app_config::AppConfig;
pub use category::{
    absolute_url, normalize_path, segment_count, slug_to_title, CategoryLevel,
    CategoryLink, PathSlugs,
};
pub use config::{
    load_app_config, load_app_config_from_env, DEFAULT_FALLBACK_USER_AGENT, DEFAULT_USER_AGENT,
};
pub use coupon::{Coupon, ScrapedCoupon};
pub use store::{DataStore, RunSummary, StoreError};
pub use tree::{build_tree, CategoryTree, LeafCategory, Subcategory, TopCategory};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid range {min_var}..{max_var}: {min} is greater than {max}")]
    InvalidRange {
        min_var: String,
        max_var: String,
        min: u64,
        max: u64,
    },
}
