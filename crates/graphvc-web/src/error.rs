//! API error responses.
//!
//! Every failure leaves the server as `{error, message, retry_after?}`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use graphvc_core::api::ApiErrorBody;
use graphvc_core::GraphvcError;
use graphvc_db::DbError;
use graphvc_extract::ExtractError;

#[derive(Debug, thiserror::Error)]
#[error("{status}: {}", body.message)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody::new(code, message),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", "Sign in to use graph history")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    pub fn daily_limit(retry_after: u64) -> Self {
        let mut err = Self::new(StatusCode::TOO_MANY_REQUESTS, "rate_limited", "Daily limit reached");
        err.body = err.body.with_retry_after(retry_after);
        err
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let retry_after = self.body.retry_after;
        let mut response = (self.status, Json(self.body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<GraphvcError> for ApiError {
    fn from(err: GraphvcError) -> Self {
        match err {
            GraphvcError::InputTooShort { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                "input_too_short",
                "Input too short, paste a full funding announcement or article for best results",
            ),
            GraphvcError::ValidationError(msg) => Self::invalid_request(msg),
            GraphvcError::NodeNotFound(id) => Self::not_found(format!("Node not found: {}", id)),
            other => {
                tracing::error!(error = %other, "Unexpected core error");
                Self::internal("Something went wrong, please try again")
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(_) => Self::not_found("Graph not found"),
            DbError::Validation(msg) => Self::invalid_request(msg),
            other => {
                tracing::error!(error = %other, "History database error");
                Self::unavailable("Graph history unavailable, please try again")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_limit_sets_retry_after() {
        let response = ApiError::daily_limit(120).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "120");
    }

    #[test]
    fn test_extract_error_mapping() {
        let err: ApiError = ExtractError::ScrapeFailed("nope".into()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.error, "scrape_failed");

        let err: ApiError = ExtractError::Unavailable("down".into()).into();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.body.retry_after.is_none());
    }

    #[test]
    fn test_input_too_short_mapping() {
        let err: ApiError = GraphvcError::InputTooShort { min: 200, actual: 12 }.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.error, "input_too_short");
    }
}
