//! Request size guard.
//!
//! # Responsibilities
//! - Reject requests whose declared Content-Length exceeds the limit
//! - Answer with 413 Payload Too Large and a JSON error body
//!
//! # Design Decisions
//! - Only the declared length is inspected; the body stream is never read,
//!   so chunked or mislabelled bodies pass through unchecked
//! - An absent or unparsable Content-Length is treated as "no declaration"

use axum::{
    extract::{Request, State},
    http::{header::CONTENT_LENGTH, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::observability::metrics;

/// Stage default when no limit is configured (1 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;

/// Limit applied by the size guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSizeLimit {
    pub max_bytes: u64,
}

impl RequestSizeLimit {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Whether a declared length breaks the limit.
    pub fn is_exceeded_by(&self, declared: Option<u64>) -> bool {
        matches!(declared, Some(len) if len > self.max_bytes)
    }
}

impl Default for RequestSizeLimit {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BYTES)
    }
}

/// Body of the 413 response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeLimitExceeded {
    pub error: &'static str,
    pub max_size: u64,
    pub status: u16,
}

impl SizeLimitExceeded {
    pub fn new(max_size: u64) -> Self {
        Self {
            error: "Request size limit exceeded",
            max_size,
            status: StatusCode::PAYLOAD_TOO_LARGE.as_u16(),
        }
    }
}

impl IntoResponse for SizeLimitExceeded {
    fn into_response(self) -> Response {
        (StatusCode::PAYLOAD_TOO_LARGE, Json(self)).into_response()
    }
}

/// Declared Content-Length, if present and well formed.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Request size guard stage.
pub async fn request_size_guard(
    State(limit): State<RequestSizeLimit>,
    request: Request,
    next: Next,
) -> Response {
    let declared = declared_length(request.headers());
    if limit.is_exceeded_by(declared) {
        tracing::warn!(
            content_length = ?declared,
            max_bytes = limit.max_bytes,
            path = %request.uri().path(),
            "Request size limit exceeded"
        );
        metrics::record_rejected("payload_too_large");
        return SizeLimitExceeded::new(limit.max_bytes).into_response();
    }

    next.run(request).await
}
