//! HTTP client for the GraphVC API.
//!
//! Dropping a returned future aborts the in-flight request, so callers can
//! cancel a generation by racing it against a shutdown signal.

use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::error::GraphApiError;
use super::types::{GenerateRequest, GenerateResponse, GraphRecord, RenameRequest, UsageInfo};
use crate::graph::model::VCGraph;

/// Identity header set by the authenticating proxy in front of the API.
pub const USER_HEADER: &str = "x-graphvc-user";

/// Header carrying a user-supplied OpenAI key.
pub const API_KEY_HEADER: &str = "x-openai-key";

/// Client-side failures.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] GraphApiError),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// The API error, if the server answered.
    pub fn api(&self) -> Option<&GraphApiError> {
        match self {
            Self::Api(e) => Some(e),
            Self::Transport(_) => None,
        }
    }
}

/// What a request carries to identify the caller.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Bearer token forwarded to the authenticating proxy
    pub token: Option<String>,
    /// Verified user id, when talking to the API directly
    pub user: Option<String>,
    /// User-supplied OpenAI key
    pub api_key: Option<String>,
}

impl Credentials {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() || self.user.is_some()
    }
}

/// Client for the generation and history endpoints.
#[derive(Clone)]
pub struct GraphApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl GraphApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate a graph from text or a URL.
    pub async fn generate(
        &self,
        request: &GenerateRequest,
        credentials: &Credentials,
    ) -> Result<GenerateResponse, ClientError> {
        let builder = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(request);

        let response: GenerateResponse = send(authorize(builder, credentials)).await?;
        debug!(
            session_id = %response.meta.session_id,
            nodes = response.graph.node_count(),
            edges = response.graph.edge_count(),
            "Graph generated"
        );
        Ok(response)
    }

    /// Current daily quota.
    pub async fn usage(&self, credentials: &Credentials) -> Result<UsageInfo, ClientError> {
        let builder = self.client.get(format!("{}/api/usage", self.base_url));
        send(authorize(builder, credentials)).await
    }

    /// Graph history of the authenticated user, newest first.
    pub async fn list_graphs(&self, credentials: &Credentials) -> Result<Vec<GraphRecord>, ClientError> {
        let builder = self.client.get(format!("{}/api/graphs", self.base_url));
        send(authorize(builder, credentials)).await
    }

    /// Graph contents by session id.
    pub async fn get_graph(
        &self,
        session_id: &str,
        credentials: &Credentials,
    ) -> Result<VCGraph, ClientError> {
        let builder = self
            .client
            .get(format!("{}/api/graphs/{}", self.base_url, session_id));
        send(authorize(builder, credentials)).await
    }

    pub async fn rename_graph(
        &self,
        id: &str,
        title: &str,
        credentials: &Credentials,
    ) -> Result<GraphRecord, ClientError> {
        let body = RenameRequest {
            title: Some(title.to_string()),
        };
        let builder = self
            .client
            .patch(format!("{}/api/graphs/{}/rename", self.base_url, id))
            .json(&body);
        send(authorize(builder, credentials)).await
    }

    pub async fn delete_graph(&self, id: &str, credentials: &Credentials) -> Result<(), ClientError> {
        let builder = self
            .client
            .delete(format!("{}/api/graphs/{}", self.base_url, id));
        let response = authorize(builder, credentials).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

fn authorize(mut builder: RequestBuilder, credentials: &Credentials) -> RequestBuilder {
    if let Some(token) = &credentials.token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(user) = &credentials.user {
        builder = builder.header(USER_HEADER, user);
    }
    if let Some(key) = &credentials.api_key {
        builder = builder.header(API_KEY_HEADER, key);
    }
    builder
}

async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
    let response = check_status(builder.send().await?).await?;
    Ok(response.json::<T>().await?)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    Err(GraphApiError::from_response(status.as_u16(), &body).into())
}
