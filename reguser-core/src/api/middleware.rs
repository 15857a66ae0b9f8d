//! Request middleware: Basic auth and request accounting

use super::handlers::ApiError;
use super::state::AppState;
use crate::config::AuthConfig;
use crate::metrics::{self, Timer};
use axum::{
    extract::{MatchedPath, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;
use tracing::{debug, warn};

/// Decode `Authorization: Basic <base64(user:pass)>`
pub(crate) fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn authorized(headers: &HeaderMap, auth: &AuthConfig) -> bool {
    match basic_credentials(headers) {
        Some((user, pass)) => user == auth.username && pass == auth.password,
        None => false,
    }
}

/// Reject requests that do not carry the configured credential
pub async fn require_basic_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !authorized(request.headers(), &state.auth) {
        debug!(path = %request.uri().path(), "rejected unauthenticated request");
        return ApiError::Unauthorized.into_response();
    }
    next.run(request).await
}

/// Count every response by route and status
pub async fn track_requests(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let timer = Timer::new("api.request.duration_ms");
    let response = next.run(request).await;
    timer.stop();

    let status = response.status();
    if status.is_server_error() {
        warn!(%route, status = status.as_u16(), "request failed");
    }
    metrics::record_request(route, status.as_u16());
    response
}
