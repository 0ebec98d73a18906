//! Caller identity.
//!
//! Authentication happens in the proxy in front of this service, which
//! forwards the verified user id in `x-graphvc-user`.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use graphvc_core::api::client::{API_KEY_HEADER, USER_HEADER};
use graphvc_redis::ratelimit::ANONYMOUS_USER;

const FALLBACK_IP: &str = "127.0.0.1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    /// BYOK key for this request only; never logged.
    pub api_key: Option<String>,
    pub ip: String,
}

impl Identity {
    pub fn is_anonymous(&self) -> bool {
        self.user_id == ANONYMOUS_USER
    }

    /// The user id, for endpoints that require sign-in.
    pub fn signed_in(&self) -> Option<&str> {
        (!self.is_anonymous()).then_some(self.user_id.as_str())
    }

    pub fn from_parts(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let ip = header("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
            .filter(|v| !v.is_empty())
            .or_else(|| peer.map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| FALLBACK_IP.to_string());

        Self {
            user_id: header(USER_HEADER).unwrap_or_else(|| ANONYMOUS_USER.to_string()),
            api_key: header(API_KEY_HEADER),
            ip,
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self::from_parts(&parts.headers, peer))
    }
}
