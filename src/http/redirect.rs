//! HTTPS redirection.
//!
//! TLS terminates in front of this server, so a request counts as secure when
//! its URI scheme is `https` or the terminating proxy reports
//! `X-Forwarded-Proto: https`. Insecure requests get a 307 to the same host and
//! path on the configured HTTPS port.

use axum::{
    extract::{Request, State},
    http::{
        header::{HOST, LOCATION},
        uri::{Authority, Scheme},
        HeaderName, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Redirection settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpsRedirection {
    /// Public HTTPS port; `None` disables redirection.
    pub https_port: Option<u16>,
}

impl HttpsRedirection {
    pub fn new(https_port: Option<u16>) -> Self {
        Self { https_port }
    }
}

/// Whether the request arrived over HTTPS.
pub fn is_secure(request: &Request) -> bool {
    if request.uri().scheme() == Some(&Scheme::HTTPS) {
        return true;
    }
    request
        .headers()
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

/// Build the redirect target, or `None` when the request names no host.
pub fn redirect_location(request: &Request, https_port: u16) -> Option<HeaderValue> {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Authority>().ok())
        .or_else(|| request.uri().authority().cloned())?;

    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let location = if https_port == 443 {
        format!("https://{}{}", host.host(), path_and_query)
    } else {
        format!("https://{}:{}{}", host.host(), https_port, path_and_query)
    };
    HeaderValue::from_str(&location).ok()
}

/// HTTPS redirection stage.
pub async fn https_redirection(
    State(redirect): State<HttpsRedirection>,
    request: Request,
    next: Next,
) -> Response {
    let Some(port) = redirect.https_port else {
        return next.run(request).await;
    };
    if is_secure(&request) {
        return next.run(request).await;
    }

    match redirect_location(&request, port) {
        Some(location) => {
            tracing::debug!(location = ?location, "Redirecting to HTTPS");
            (StatusCode::TEMPORARY_REDIRECT, [(LOCATION, location)]).into_response()
        }
        None => next.run(request).await,
    }
}
