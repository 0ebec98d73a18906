//! Graph generation endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use graphvc_core::api::{GenerateRequest, GenerateResponse};
use graphvc_redis::ratelimit;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::pipeline::{check_input, run_generate_pipeline};
use crate::state::AppState;

/// `POST /api/generate`
///
/// Requests carrying their own OpenAI key are not counted against the
/// daily limit, and neither are requests rejected by input checks.
pub async fn generate(
    State(state): State<AppState>,
    identity: Identity,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::invalid_request(e.body_text()))?;
    check_input(&state, &request).await?;

    if identity.api_key.is_none() {
        match ratelimit::check_rate_limit(state.redis.as_ref(), &identity.user_id, &identity.ip).await {
            Ok(decision) if !decision.allowed => return Err(ApiError::daily_limit(decision.retry_after)),
            Ok(_) => {}
            // Counting is best effort; an unreachable Redis does not block generation.
            Err(e) => tracing::warn!(error = %e, "Rate limit check failed"),
        }
    }

    let response =
        run_generate_pipeline(&state, &request, &identity.user_id, identity.api_key.as_deref()).await?;
    Ok(Json(response))
}
