//! Graph extraction through OpenAI structured outputs.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use graphvc_core::VCGraph;

use crate::error::{ExtractError, ExtractResult};
use crate::prompts::SYSTEM_PROMPT;
use crate::schema::openai_schema;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const SCHEMA_NAME: &str = "vc_knowledge_graph";

/// Model output plus what it cost.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub graph: VCGraph,
    pub token_count: u32,
}

/// Turns text into a graph.
#[async_trait]
pub trait GraphExtractor: Send + Sync {
    /// `user_key` replaces the configured key for this call only.
    async fn extract(&self, content: &str, user_key: Option<&str>) -> ExtractResult<Extraction>;
}

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct StructuredRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    response_format: Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

/// OpenAI chat completions client bound to the graph schema.
pub struct OpenAiExtractor {
    config: OpenAiConfig,
    http: reqwest::Client,
    response_format: Value,
}

impl OpenAiExtractor {
    pub fn new(config: OpenAiConfig) -> ExtractResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExtractError::unavailable(format!("HTTP client error: {}", e)))?;

        let response_format = json!({
            "type": "json_schema",
            "json_schema": {
                "name": SCHEMA_NAME,
                "strict": true,
                "schema": openai_schema::<VCGraph>(),
            }
        });

        Ok(Self {
            config,
            http,
            response_format,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl GraphExtractor for OpenAiExtractor {
    async fn extract(&self, content: &str, user_key: Option<&str>) -> ExtractResult<Extraction> {
        let api_key = user_key
            .filter(|k| !k.trim().is_empty())
            .or(self.config.api_key.as_deref())
            .ok_or_else(|| {
                tracing::error!("No OpenAI API key configured");
                configuration_error()
            })?;

        let request = StructuredRequest {
            model: &self.config.model,
            messages: vec![
                Message { role: "system", content: SYSTEM_PROMPT },
                Message { role: "user", content },
            ],
            temperature: 0.0,
            response_format: self.response_format.clone(),
        };

        tracing::debug!(
            model = %self.config.model,
            chars = content.len(),
            byok = user_key.is_some(),
            "Requesting graph extraction"
        );

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url.trim_end_matches('/')))
            .bearer_auth(api_key.trim())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "OpenAI request failed");
                ai_unavailable()
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "OpenAI API error");
            return Err(map_status(status.as_u16()));
        }

        let completion: ChatCompletion = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "Unreadable OpenAI response");
            ai_unavailable()
        })?;

        let token_count = completion.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0);
        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(ai_unavailable)?;

        if let Some(refusal) = message.refusal {
            tracing::info!(refusal = %refusal, "Model refused extraction");
            return Err(unprocessable());
        }

        let raw = message.content.ok_or_else(ai_unavailable)?;
        let graph: VCGraph = serde_json::from_str(&raw).map_err(|e| {
            tracing::warn!(error = %e, "Model output did not match the graph schema");
            ai_unavailable()
        })?;

        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            tokens = token_count,
            "Extraction complete"
        );

        Ok(Extraction { graph, token_count })
    }
}

fn map_status(status: u16) -> ExtractError {
    match status {
        429 => ExtractError::RateLimited("Too many requests, please try again in a moment".into()),
        401 | 403 => configuration_error(),
        400 => unprocessable(),
        _ => ai_unavailable(),
    }
}

fn configuration_error() -> ExtractError {
    ExtractError::unavailable("AI service configuration error, please try again later")
}

fn unprocessable() -> ExtractError {
    ExtractError::InvalidRequest("Input could not be processed, try shortening or rephrasing it".into())
}

fn ai_unavailable() -> ExtractError {
    ExtractError::unavailable("AI service unavailable, please try again")
}
