//! Error taxonomy of the generation API.
//!
//! Every failing endpoint answers with an [`ApiErrorBody`]. Callers wrap it
//! in a [`GraphApiError`] together with the HTTP status and classify it:
//! scrape failures get a dedicated message, 429s are rate limits, the rest
//! is shown as-is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown for any failure classified as a scrape failure.
pub const SCRAPE_FAILURE_MESSAGE: &str = "Couldn't read that URL, try pasting the text instead";

/// Replaces the bare `HTTP 503` of a cold-starting backend.
pub const WARMING_UP_MESSAGE: &str = "Service is warming up, please wait a moment and try again";

/// JSON error shape returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ApiErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }
}

/// A failed API call: HTTP status plus the decoded error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphApiError {
    pub status: u16,
    pub detail: ApiErrorBody,
}

impl GraphApiError {
    pub fn new(status: u16, detail: ApiErrorBody) -> Self {
        Self { status, detail }
    }

    /// Build from a raw failure response.
    ///
    /// A body that is not JSON becomes `unknown_error` / `HTTP <status>`.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let mut detail = serde_json::from_slice::<ApiErrorBody>(body)
            .unwrap_or_else(|_| ApiErrorBody::new("unknown_error", format!("HTTP {}", status)));

        if status == 503 && detail.message == "HTTP 503" {
            detail = ApiErrorBody::new("service_unavailable", WARMING_UP_MESSAGE);
        }

        Self { status, detail }
    }

    /// True if the error is a failure to read the submitted URL.
    pub fn is_scrape_failure(&self) -> bool {
        if self.status != 400 {
            return false;
        }
        let error = &self.detail.error;
        let message = self.detail.message.to_lowercase();

        error.contains("scrape")
            || error.contains("invalid_url")
            || message.contains("scrape")
            || message.contains("couldn't read")
            || message.contains("hostname")
            || message.contains("resolve")
    }

    /// True if the daily quota or the upstream model rate limit was hit.
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Seconds until the caller may retry, when the server said so.
    pub fn retry_after(&self) -> Option<u64> {
        self.detail.retry_after
    }

    /// The message a front end should display.
    pub fn user_message(&self) -> String {
        if self.is_scrape_failure() {
            SCRAPE_FAILURE_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for GraphApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.message.is_empty() {
            write!(f, "API error {}", self.status)
        } else {
            f.write_str(&self.detail.message)
        }
    }
}

impl std::error::Error for GraphApiError {}
