//! Daily quota lookup.

use axum::{extract::State, Json};

use graphvc_core::api::UsageInfo;
use graphvc_redis::ratelimit;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;

pub async fn usage(State(state): State<AppState>, identity: Identity) -> Result<Json<UsageInfo>, ApiError> {
    let usage = ratelimit::get_usage(state.redis.as_ref(), &identity.user_id, &identity.ip)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Usage lookup failed");
            ApiError::unavailable("Usage is unavailable right now")
        })?;
    Ok(Json(usage))
}
