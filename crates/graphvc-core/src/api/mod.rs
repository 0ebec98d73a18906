//! Generation API contract, error taxonomy and HTTP client.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientError, Credentials, GraphApiClient};
pub use error::{ApiErrorBody, GraphApiError, SCRAPE_FAILURE_MESSAGE, WARMING_UP_MESSAGE};
pub use types::{
    GenerateMeta, GenerateRequest, GenerateResponse, GraphRecord, RenameRequest, SourceType,
    UsageInfo,
};
