//! Graph history and retrieval.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use graphvc_core::api::{GraphRecord, RenameRequest};
use graphvc_core::VCGraph;
use graphvc_db::{graphs, DbPool};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;

fn history(state: &AppState) -> Result<&DbPool, ApiError> {
    state
        .history
        .as_ref()
        .ok_or_else(|| ApiError::unavailable("Graph history is not configured"))
}

/// `GET /api/graphs`
pub async fn list_graphs(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<GraphRecord>>, ApiError> {
    let user_id = identity.signed_in().ok_or_else(ApiError::unauthorized)?;
    let records = graphs::list_graphs(history(&state)?, &[user_id])?;
    Ok(Json(records))
}

/// `GET /api/graphs/{session_id}`
pub async fn get_graph(
    State(state): State<AppState>,
    identity: Identity,
    Path(session_id): Path<String>,
) -> Result<Json<VCGraph>, ApiError> {
    let graph = state
        .graphs
        .get_graph_by_session(&session_id, Some(&identity.user_id))
        .await
        .map_err(|e| {
            tracing::error!(session_id = %session_id, error = %e, "Graph lookup failed");
            ApiError::unavailable("Graph database unavailable, please try again")
        })?
        .ok_or_else(|| ApiError::not_found("Graph not found"))?;

    Ok(Json(graph))
}

/// `PATCH /api/graphs/{id}/rename`
pub async fn rename_graph(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    body: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<GraphRecord>, ApiError> {
    let user_id = identity.signed_in().ok_or_else(ApiError::unauthorized)?;
    let Json(request) = body.map_err(|e| ApiError::invalid_request(e.body_text()))?;

    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::invalid_request("Title is required"))?;

    let record = graphs::rename_graph(history(&state)?, &id, user_id, title)?;
    Ok(Json(record))
}

/// `DELETE /api/graphs/{id}`
pub async fn delete_graph(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user_id = identity.signed_in().ok_or_else(ApiError::unauthorized)?;
    let record = graphs::delete_graph(history(&state)?, &id, user_id)?;

    if let Err(e) = state.graphs.delete_session(&record.session_id).await {
        tracing::warn!(session_id = %record.session_id, error = %e, "Failed to delete graph contents");
    }

    Ok(StatusCode::NO_CONTENT)
}
