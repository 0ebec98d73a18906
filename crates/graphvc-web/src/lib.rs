//! GraphVC Web Server
//!
//! Axum-based JSON API for graph generation, usage and history.

pub mod error;
pub mod identity;
pub mod pipeline;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use error::ApiError;
pub use identity::Identity;
pub use pipeline::run_generate_pipeline;
pub use state::AppState;

/// Where the server listens.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// Whether only this machine can reach the server.
    pub fn is_loopback(&self) -> bool {
        let host = self.host.trim_matches(|c| c == '[' || c == ']');
        host.eq_ignore_ascii_case("localhost")
            || host.parse::<std::net::IpAddr>().is_ok_and(|ip| ip.is_loopback())
    }
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/generate", post(routes::generate::generate))
        .route("/usage", get(routes::usage::usage))
        .route("/graphs", get(routes::graphs::list_graphs))
        .route("/graphs/{id}", get(routes::graphs::get_graph))
        .route("/graphs/{id}", delete(routes::graphs::delete_graph))
        .route("/graphs/{id}/rename", patch(routes::graphs::rename_graph));

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server until it is shut down.
pub async fn run_server(state: AppState, config: &ServerConfig) -> anyhow::Result<()> {
    let app = create_router(state);

    if !config.is_loopback() {
        // Identity comes from proxy headers and is not verified here.
        tracing::warn!(
            host = %config.host,
            "Listening beyond loopback: put an authenticating proxy in front, \
             clients can otherwise claim any user id in {}",
            graphvc_core::api::client::USER_HEADER
        );
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("GraphVC API listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use graphvc_core::api::client::{API_KEY_HEADER, USER_HEADER};
    use graphvc_core::api::{GenerateRequest, GenerateResponse, GraphRecord};
    use graphvc_core::{EntityType, GraphEdge, GraphNode, NodeProperties, RelationshipType, VCGraph};
    use graphvc_db::{graphs, DbPool};
    use graphvc_extract::{ExtractError, ExtractResult, Extraction, GraphExtractor, Scraper, ScraperConfig, UrlValidator};
    use graphvc_graph::{GraphRepository, InMemoryGraphRepository};

    struct StubExtractor {
        graph: VCGraph,
        fail_with: Option<fn() -> ExtractError>,
        calls: AtomicU32,
        last_key: std::sync::Mutex<Option<String>>,
    }

    impl StubExtractor {
        fn returning(graph: VCGraph) -> Self {
            Self {
                graph,
                fail_with: None,
                calls: AtomicU32::new(0),
                last_key: std::sync::Mutex::new(None),
            }
        }

        fn failing(f: fn() -> ExtractError) -> Self {
            Self {
                fail_with: Some(f),
                ..Self::returning(VCGraph::default())
            }
        }
    }

    #[async_trait]
    impl GraphExtractor for StubExtractor {
        async fn extract(&self, _content: &str, user_key: Option<&str>) -> ExtractResult<Extraction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_key.lock().unwrap() = user_key.map(String::from);
            if let Some(f) = self.fail_with {
                return Err(f());
            }
            Ok(Extraction {
                graph: self.graph.clone(),
                token_count: 321,
            })
        }
    }

    struct FailingRepository;

    #[async_trait]
    impl GraphRepository for FailingRepository {
        async fn persist_graph(&self, _: &str, _: &VCGraph, _: &str) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
        async fn get_graph_by_session(&self, _: &str, _: Option<&str>) -> anyhow::Result<Option<VCGraph>> {
            anyhow::bail!("connection refused")
        }
        async fn delete_session(&self, _: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn sample_graph() -> VCGraph {
        let node = |id: &str, t| GraphNode {
            id: id.to_string(),
            label: id.to_uppercase(),
            entity_type: t,
            properties: NodeProperties::default(),
        };
        VCGraph {
            nodes: vec![node("paradigm", EntityType::Investor), node("uniswap", EntityType::Project)],
            edges: vec![
                GraphEdge {
                    source: "paradigm".into(),
                    target: "uniswap".into(),
                    relationship: RelationshipType::InvestedIn,
                },
                GraphEdge {
                    source: "paradigm".into(),
                    target: "ghost".into(),
                    relationship: RelationshipType::Led,
                },
            ],
        }
    }

    fn history_db() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        graphvc_db::run_migrations(&pool).unwrap();
        pool
    }

    struct Harness {
        app: Router,
        extractor: Arc<StubExtractor>,
        graphs: Arc<InMemoryGraphRepository>,
        history: DbPool,
    }

    fn harness(extractor: StubExtractor) -> Harness {
        let extractor = Arc::new(extractor);
        let graphs = Arc::new(InMemoryGraphRepository::new());
        let history = history_db();
        let state = AppState::new(extractor.clone(), graphs.clone()).with_history(history.clone());
        Harness {
            app: create_router(state),
            extractor,
            graphs,
            history,
        }
    }

    fn long_text() -> String {
        "Paradigm led a $50M Series B in Uniswap alongside a16z and Polychain. ".repeat(4)
    }

    fn generate_request(input: &str, user: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header(USER_HEADER, user);
        }
        builder
            .body(Body::from(json!({ "input": input }).to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_server_config_loopback() {
        let config = |host: &str| ServerConfig {
            host: host.to_string(),
            port: 8000,
        };
        assert!(ServerConfig::default().is_loopback());
        assert!(config("localhost").is_loopback());
        assert!(config("[::1]").is_loopback());
        assert!(config("127.0.0.2").is_loopback());
        assert!(!config("0.0.0.0").is_loopback());
        assert!(!config("192.168.1.20").is_loopback());
        assert!(!config("graphvc.internal").is_loopback());
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness(StubExtractor::returning(sample_graph()));
        let response = h
            .app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_generate_text_anonymous() {
        let h = harness(StubExtractor::returning(sample_graph()));
        let response = h.app.oneshot(generate_request(&long_text(), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: GenerateResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(body.graph.node_count(), 2);
        assert_eq!(body.graph.edge_count(), 1, "dangling edge is pruned");
        assert_eq!(body.meta.token_count, 321);
        assert_eq!(body.meta.source_type.as_str(), "text");
        assert!(!body.meta.cache_hit);

        assert!(h
            .graphs
            .get_graph_by_session(&body.meta.session_id, None)
            .await
            .unwrap()
            .is_some());
        assert!(graphs::get_by_session(&h.history, &body.meta.session_id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_generate_saves_history_for_signed_in_user() {
        let h = harness(StubExtractor::returning(sample_graph()));
        let response = h.app.oneshot(generate_request(&long_text(), Some("user_1"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: GenerateResponse = serde_json::from_value(body_json(response).await).unwrap();

        let record = graphs::get_by_session(&h.history, &body.meta.session_id).unwrap().unwrap();
        assert_eq!(record.node_count, 2);
        assert_eq!(record.edge_count, 1);
        assert!(record.title.starts_with("Paradigm led a $50M"));
        assert!(record.title.ends_with("..."));
        assert!(record.source_url.is_none());
    }

    #[tokio::test]
    async fn test_generate_rejects_short_text() {
        let h = harness(StubExtractor::returning(sample_graph()));
        let response = h.app.oneshot(generate_request("too short", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "input_too_short");
        assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_rejects_malformed_body() {
        let h = harness(StubExtractor::returning(sample_graph()));
        let request = Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header("content-type", "application/json")
            .body(Body::from("{\"nope\": 1}"))
            .unwrap();
        let response = h.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_generate_maps_extraction_errors() {
        let h = harness(StubExtractor::failing(|| ExtractError::RateLimited("slow down".into())));
        let response = h.app.oneshot(generate_request(&long_text(), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(response).await;
        assert_eq!(body["error"], "rate_limited");
        assert_eq!(body["message"], "slow down");
    }

    #[tokio::test]
    async fn test_generate_rejects_private_url() {
        let h = harness(StubExtractor::returning(sample_graph()));
        let response = h
            .app
            .oneshot(generate_request("https://169.254.169.254/latest/meta-data", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "invalid_url");
    }

    #[tokio::test]
    async fn test_check_input_runs_before_counting() {
        let state = AppState::new(
            Arc::new(StubExtractor::returning(sample_graph())),
            Arc::new(InMemoryGraphRepository::new()),
        );

        let err = pipeline::check_input(&state, &GenerateRequest::new("too short"))
            .await
            .unwrap_err();
        assert_eq!(err.body.error, "input_too_short");

        let err = pipeline::check_input(&state, &GenerateRequest::new("https://198.18.0.1/deal"))
            .await
            .unwrap_err();
        assert_eq!(err.body.error, "invalid_url");

        assert!(pipeline::check_input(&state, &GenerateRequest::new(long_text())).await.is_ok());
    }

    #[tokio::test]
    async fn test_generate_scrapes_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/story")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(format!("<article><p>{}</p></article>", long_text().repeat(3)))
            .create_async()
            .await;

        let extractor = Arc::new(StubExtractor::returning(sample_graph()));
        let scraper = Scraper::new(
            ScraperConfig::default(),
            UrlValidator::new().allow_scheme("http").allow_host("127.0.0.1"),
        );
        let state = AppState::new(extractor.clone(), Arc::new(InMemoryGraphRepository::new())).with_scraper(scraper);
        let app = create_router(state);

        let url = format!("{}/story", server.url());
        let response = app.oneshot(generate_request(&url, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: GenerateResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(body.meta.source_type.as_str(), "url");
        assert!(body.meta.cache_age_seconds.is_none());
    }

    #[tokio::test]
    async fn test_generate_forwards_user_key() {
        let h = harness(StubExtractor::returning(sample_graph()));
        let mut request = generate_request(&long_text(), None);
        request.headers_mut().insert(API_KEY_HEADER, "sk-user-key".parse().unwrap());
        let response = h.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.extractor.last_key.lock().unwrap().as_deref(), Some("sk-user-key"));
    }

    #[tokio::test]
    async fn test_generate_empty_graph_is_not_persisted() {
        let h = harness(StubExtractor::returning(VCGraph::default()));
        let response = h.app.oneshot(generate_request(&long_text(), Some("user_1"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: GenerateResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert!(body.graph.is_empty());
        assert!(h.graphs.is_empty());
        assert!(graphs::list_graphs(&h.history, &["user_1"]).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_graph_store_failure_is_503() {
        let state = AppState::new(
            Arc::new(StubExtractor::returning(sample_graph())),
            Arc::new(FailingRepository),
        );
        let response = create_router(state)
            .oneshot(generate_request(&long_text(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await["message"],
            "Graph database unavailable, please try again"
        );
    }

    #[tokio::test]
    async fn test_usage_without_redis() {
        let h = harness(StubExtractor::returning(sample_graph()));
        let response = h
            .app
            .oneshot(Request::builder().uri("/api/usage").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"used": 0, "limit": 0, "reset": 0}));
    }

    #[tokio::test]
    async fn test_history_requires_sign_in() {
        let h = harness(StubExtractor::returning(sample_graph()));
        let response = h
            .app
            .oneshot(Request::builder().uri("/api/graphs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_history_list_rename_delete() {
        let h = harness(StubExtractor::returning(sample_graph()));

        let response = h
            .app
            .clone()
            .oneshot(generate_request(&long_text(), Some("user_1")))
            .await
            .unwrap();
        let generated: GenerateResponse = serde_json::from_value(body_json(response).await).unwrap();

        let response = h
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/graphs")
                    .header(USER_HEADER, "user_1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let records: Vec<GraphRecord> = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(records.len(), 1);
        let id = records[0].id.clone();

        let rename = |user: &str, title: Value| {
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/graphs/{}/rename", id))
                .header(USER_HEADER, user)
                .header("content-type", "application/json")
                .body(Body::from(json!({ "title": title }).to_string()))
                .unwrap()
        };

        let response = h.app.clone().oneshot(rename("user_1", json!("  Uniswap B  "))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["title"], "Uniswap B");

        let response = h.app.clone().oneshot(rename("user_1", json!("   "))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = h.app.clone().oneshot(rename("user_2", json!("Mine now"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let delete = |user: &str| {
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/graphs/{}", id))
                .header(USER_HEADER, user)
                .body(Body::empty())
                .unwrap()
        };
        let response = h.app.clone().oneshot(delete("user_2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = h.app.clone().oneshot(delete("user_1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(h
            .graphs
            .get_graph_by_session(&generated.meta.session_id, None)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_get_graph_checks_ownership() {
        let h = harness(StubExtractor::returning(sample_graph()));
        h.graphs.persist_graph("sess-1", &sample_graph(), "user_1").await.unwrap();

        let get = |user: Option<&str>, session: &str| {
            let mut builder = Request::builder().uri(format!("/api/graphs/{}", session));
            if let Some(user) = user {
                builder = builder.header(USER_HEADER, user);
            }
            builder.body(Body::empty()).unwrap()
        };

        let response = h.app.clone().oneshot(get(Some("user_1"), "sess-1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let graph: VCGraph = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(graph.node_count(), 2);

        let response = h.app.clone().oneshot(get(Some("user_2"), "sess-1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = h.app.clone().oneshot(get(None, "missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "not_found");
    }

    #[tokio::test]
    async fn test_history_without_database_is_503() {
        let state = AppState::new(
            Arc::new(StubExtractor::returning(sample_graph())),
            Arc::new(InMemoryGraphRepository::new()),
        );
        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/graphs")
                    .header(USER_HEADER, "user_1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
