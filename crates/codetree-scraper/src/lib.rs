pub mod block;
pub mod discover;
pub mod error;
pub mod extract;
pub mod outcome;
pub mod pacing;
pub mod pipeline;
pub mod retry;
pub mod selectors;
pub mod session;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod validate;

pub use block::is_block_title;
pub use discover::CategoryDiscoverer;
pub use error::ScraperError;
pub use extract::CouponExtractor;
pub use outcome::{OutcomeKind, PageOutcome};
pub use pacing::{pause, DelayRange};
pub use pipeline::{scrape_categories, CategoryRun, CategoryStats};
pub use retry::{retry_until_nonempty, RetryPolicy, RetryReport};
#[cfg(feature = "browser")]
pub use session::chrome::SessionConfig;
pub use session::{BrowserSession, USER_AGENT_HEADER};
#[cfg(feature = "browser")]
pub use session::ChromeSession;
pub use settings::ScrapeSettings;
pub use validate::{resolve_shop_url, validate_coupon, Validation};
