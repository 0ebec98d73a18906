//! Error types for scraping and extraction.

use thiserror::Error;

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Extraction failures. Each variant maps onto one API error code.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// URL rejected by the SSRF guard
    #[error("{0}")]
    InvalidUrl(String),

    /// Page fetched but unusable (HTTP error, too large, not HTML, too little text)
    #[error("{0}")]
    ScrapeFailed(String),

    /// Upstream model rejected the input
    #[error("{0}")]
    InvalidRequest(String),

    /// Upstream model rate limit
    #[error("{0}")]
    RateLimited(String),

    /// Network failure, timeout, or upstream outage
    #[error("{0}")]
    Unavailable(String),
}

impl ExtractError {
    /// API error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::ScrapeFailed(_) => "scrape_failed",
            Self::InvalidRequest(_) => "invalid_request",
            Self::RateLimited(_) => "rate_limited",
            Self::Unavailable(_) => "service_unavailable",
        }
    }

    /// HTTP status the API answers with.
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidUrl(_) | Self::ScrapeFailed(_) | Self::InvalidRequest(_) => 400,
            Self::RateLimited(_) => 429,
            Self::Unavailable(_) => 503,
        }
    }

    pub(crate) fn invalid_url(msg: impl Into<String>) -> Self {
        Self::InvalidUrl(msg.into())
    }

    pub(crate) fn scrape_failed(msg: impl Into<String>) -> Self {
        Self::ScrapeFailed(msg.into())
    }

    pub(crate) fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
