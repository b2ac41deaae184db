//! Cross-origin response headers.
//!
//! Sets fixed allow-origin, allow-methods and allow-headers values on every
//! response. Preflight `OPTIONS` requests get no special treatment; they are
//! routed like any other request.

use axum::{
    extract::{Request, State},
    http::{
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN},
        HeaderValue,
    },
    middleware::Next,
    response::Response,
};

use crate::config::CorsConfig;

/// Header values for the cross-origin stage.
#[derive(Debug, Clone)]
pub struct CrossOriginPolicy {
    pub allow_origin: HeaderValue,
    pub allow_methods: HeaderValue,
    pub allow_headers: HeaderValue,
}

impl Default for CrossOriginPolicy {
    fn default() -> Self {
        Self {
            allow_origin: HeaderValue::from_static("https://trusted.example.com"),
            allow_methods: HeaderValue::from_static("GET, POST, PUT, DELETE"),
            allow_headers: HeaderValue::from_static("Authorization, Content-Type"),
        }
    }
}

impl TryFrom<&CorsConfig> for CrossOriginPolicy {
    type Error = axum::http::header::InvalidHeaderValue;

    fn try_from(config: &CorsConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            allow_origin: HeaderValue::from_str(&config.allow_origin)?,
            allow_methods: HeaderValue::from_str(&config.allow_methods)?,
            allow_headers: HeaderValue::from_str(&config.allow_headers)?,
        })
    }
}

/// Cross-origin policy stage.
pub async fn cross_origin_policy(
    State(policy): State<CrossOriginPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, policy.allow_origin);
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, policy.allow_methods);
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, policy.allow_headers);
    response
}
