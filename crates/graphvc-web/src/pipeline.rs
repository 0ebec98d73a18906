//! The generate pipeline: input to persisted graph.

use std::time::Instant;

use graphvc_core::api::{GenerateMeta, GenerateRequest, GenerateResponse, SourceType};
use graphvc_core::input::{auto_title, cap_content, is_url, validate_input_length};
use graphvc_db::graphs::{self, NewGraph};
use graphvc_redis::scrape_cache;

use crate::error::ApiError;
use crate::state::AppState;

/// Reject input the pipeline would refuse anyway: text below the minimum
/// length, or a URL that fails the address checks. Runs before the daily
/// limit is counted.
pub async fn check_input(state: &AppState, request: &GenerateRequest) -> Result<(), ApiError> {
    let input = request.input.trim();
    if is_url(input) {
        state.scraper.validator().validate(input).await?;
    } else {
        validate_input_length(input)?;
    }
    Ok(())
}

/// Run one generation for `user_id`.
///
/// URL inputs are served from the scrape cache unless `force_refresh` is
/// set. History rows are written for signed-in users only, and a history
/// failure never fails the request.
pub async fn run_generate_pipeline(
    state: &AppState,
    request: &GenerateRequest,
    user_id: &str,
    api_key: Option<&str>,
) -> Result<GenerateResponse, ApiError> {
    let started = Instant::now();
    let session_id = uuid::Uuid::new_v4().to_string();
    let input = request.input.trim();

    let mut cache_hit = false;
    let mut cache_age_seconds = None;

    let (content, source_type) = if is_url(input) {
        let mut cached = None;
        if !request.force_refresh {
            match scrape_cache::get_cached_scrape(state.redis.as_ref(), input).await {
                Ok((Some(text), age)) => {
                    cache_hit = true;
                    cache_age_seconds = age;
                    cached = Some(text);
                }
                Ok((None, _)) => {}
                Err(e) => tracing::warn!(error = %e, "Scrape cache lookup failed"),
            }
        }

        let text = match cached {
            Some(text) => text,
            None => {
                let text = state.scraper.scrape(input).await?;
                if let Err(e) = scrape_cache::cache_scrape(state.redis.as_ref(), input, &text).await {
                    tracing::warn!(error = %e, "Failed to cache scraped page");
                }
                text
            }
        };
        (text, SourceType::Url)
    } else {
        validate_input_length(input)?;
        (cap_content(input).to_string(), SourceType::Text)
    };

    tracing::info!(
        session_id = %session_id,
        source_type = source_type.as_str(),
        chars = content.len(),
        cache_hit,
        "Generating graph"
    );

    let extraction = state.extractor.extract(&content, api_key).await?;
    let mut graph = extraction.graph;

    let pruned = graph.prune_dangling_edges();
    if pruned > 0 {
        tracing::debug!(session_id = %session_id, pruned, "Dropped edges with unknown endpoints");
    }

    if graph.is_empty() {
        tracing::info!(session_id = %session_id, "No VC entities found");
    } else {
        state
            .graphs
            .persist_graph(&session_id, &graph, user_id)
            .await
            .map_err(|e| {
                tracing::error!(session_id = %session_id, error = %e, "Failed to persist graph");
                ApiError::unavailable("Graph database unavailable, please try again")
            })?;

        save_history(state, user_id, input, &session_id, &graph);
    }

    Ok(GenerateResponse {
        meta: GenerateMeta {
            session_id,
            token_count: extraction.token_count,
            source_type,
            processing_ms: started.elapsed().as_millis() as u64,
            cache_hit,
            cache_age_seconds,
        },
        graph,
    })
}

fn save_history(
    state: &AppState,
    user_id: &str,
    input: &str,
    session_id: &str,
    graph: &graphvc_core::VCGraph,
) {
    let Some(history) = &state.history else {
        return;
    };
    if user_id == graphvc_redis::ratelimit::ANONYMOUS_USER {
        return;
    }

    let title = auto_title(input, &chrono::Local::now());
    let row = NewGraph {
        user_id,
        title: &title,
        source_url: is_url(input).then_some(input),
        node_count: graph.node_count() as u32,
        edge_count: graph.edge_count() as u32,
        session_id,
    };

    if let Err(e) = graphs::insert_graph(history, &row) {
        tracing::warn!(session_id, error = %e, "Failed to save graph history");
    }
}
