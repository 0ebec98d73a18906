//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};

use crate::graph::model::VCGraph;

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Text or HTTPS URL to analyze
    pub input: String,
    /// Bypass the URL scrape cache
    #[serde(default)]
    pub force_refresh: bool,
}

impl GenerateRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            force_refresh: false,
        }
    }
}

/// Whether the input was scraped from a URL or sent as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Url,
    Text,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateMeta {
    pub session_id: String,
    pub token_count: u32,
    pub source_type: SourceType,
    pub processing_ms: u64,
    #[serde(default)]
    pub cache_hit: bool,
    #[serde(default)]
    pub cache_age_seconds: Option<u64>,
}

/// Body of a successful `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub graph: VCGraph,
    pub meta: GenerateMeta,
}

/// Daily quota snapshot from `GET /api/usage`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageInfo {
    pub used: u32,
    pub limit: u32,
    /// Unix timestamp at which the current window ends
    pub reset: u64,
}

impl UsageInfo {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }
}

/// A graph history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphRecord {
    pub id: String,
    pub title: String,
    pub source_url: Option<String>,
    pub node_count: u32,
    pub edge_count: u32,
    pub session_id: String,
    pub created_at: String,
}

/// Body of `PATCH /api/graphs/{id}/rename`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    pub title: Option<String>,
}
