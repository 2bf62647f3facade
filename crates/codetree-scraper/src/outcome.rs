use std::fmt;

use codetree_core::Coupon;

use crate::error::ScraperError;

/// Result of reading one category page.
///
/// Callers that only want coupons use [`PageOutcome::into_coupons`], which
/// maps every non-success to an empty list. The variants keep "blocked",
/// "timed out" and "genuinely empty" apart for logging and run summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The coupon grid was found. The list may be empty.
    Coupons(Vec<Coupon>),
    /// Still blocked after the fallback header swap.
    Blocked { title: String },
    Timeout,
    /// The page rendered without a coupon grid.
    NotFound,
    /// Any other browser failure, kept for diagnostics.
    Failed(String),
}

impl PageOutcome {
    #[must_use]
    pub fn from_error(err: ScraperError) -> Self {
        match err {
            ScraperError::NavigationTimeout { .. } => Self::Timeout,
            ScraperError::BlockedPage { title, .. } => Self::Blocked { title },
            ScraperError::SelectorNotFound { .. } => Self::NotFound,
            other => Self::Failed(other.to_string()),
        }
    }

    #[must_use]
    pub fn has_coupons(&self) -> bool {
        matches!(self, Self::Coupons(c) if !c.is_empty())
    }

    #[must_use]
    pub fn coupon_count(&self) -> usize {
        match self {
            Self::Coupons(c) => c.len(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Coupons(c) if !c.is_empty() => OutcomeKind::Succeeded,
            Self::Coupons(_) | Self::NotFound => OutcomeKind::Empty,
            Self::Blocked { .. } => OutcomeKind::Blocked,
            Self::Timeout => OutcomeKind::TimedOut,
            Self::Failed(_) => OutcomeKind::Failed,
        }
    }

    #[must_use]
    pub fn into_coupons(self) -> Vec<Coupon> {
        match self {
            Self::Coupons(c) => c,
            _ => Vec::new(),
        }
    }
}

/// Coarse classification of a [`PageOutcome`] used for run statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Succeeded,
    Empty,
    Blocked,
    TimedOut,
    Failed,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Succeeded => "succeeded",
            Self::Empty => "empty",
            Self::Blocked => "blocked",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}
