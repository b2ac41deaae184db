//! Global exception boundary.
//!
//! # Responsibilities
//! - Catch failures raised by inner stages and handlers
//! - Log them with their diagnostic trace
//! - Answer with a JSON envelope whose status follows the failure kind
//!
//! # Design Decisions
//! - Failures travel as a response extension, not as a rendered body, so the
//!   boundary is the only place that shapes and logs them
//! - Panics are converted to failures by a catch-panic layer directly inside
//!   the boundary
//! - The envelope carries the full trace in `Details`; operators exposing the
//!   service publicly should treat that as an information disclosure

use std::any::Any;

use axum::{
    extract::Request,
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::Failure;
use crate::observability::metrics;

/// JSON envelope for unhandled failures.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FailureBody {
    pub error: String,
    pub status_code: u16,
    pub message: String,
    pub details: String,
}

impl From<Failure> for FailureBody {
    fn from(failure: Failure) -> Self {
        Self {
            status_code: failure.status_code().as_u16(),
            error: failure.name,
            message: failure.message,
            details: failure.details,
        }
    }
}

/// Render a failure as the client-facing JSON response.
pub fn failure_response(failure: Failure) -> Response {
    let status = failure.status_code();
    (status, Json(FailureBody::from(failure))).into_response()
}

/// Exception boundary stage. Never re-raises.
pub async fn exception_boundary(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let mut response = next.run(request).await;
    let Some(failure) = response.extensions_mut().remove::<Failure>() else {
        return response;
    };

    let status = failure.status_code();
    tracing::error!(
        error = %failure.name,
        status = status.as_u16(),
        method = %method,
        path = %path,
        message = %failure.message,
        details = %failure.details,
        "An unhandled failure occurred while processing the request"
    );
    metrics::record_failure(failure.kind, status.as_u16());

    failure_response(failure)
}

/// Catch-panic handler placed inside the boundary: raises the panic as a
/// failure for the boundary to render.
pub fn raise_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    Failure::from_panic(payload).into_raised_response()
}

/// Catch-panic handler for development mode: an HTML diagnostics page.
pub fn developer_page(payload: Box<dyn Any + Send + 'static>) -> Response {
    let failure = Failure::from_panic(payload);
    tracing::error!(message = %failure.message, "Panic escaped the request pipeline");

    let page = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Internal Server Error</title></head>\n<body>\n\
         <h1>An unhandled failure occurred while processing the request.</h1>\n\
         <h2>{}: {}</h2>\n<pre>{}</pre>\n</body>\n</html>\n",
        escape_html(&failure.name),
        escape_html(&failure.message),
        escape_html(&failure.details),
    );
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"))],
        page,
    )
        .into_response()
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
