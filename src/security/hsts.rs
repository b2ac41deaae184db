//! Strict-Transport-Security stage.

use axum::{
    extract::{Request, State},
    http::{header::STRICT_TRANSPORT_SECURITY, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::config::HstsConfig;

/// Precomputed HSTS header value.
#[derive(Debug, Clone)]
pub struct StrictTransportSecurity {
    value: HeaderValue,
}

impl StrictTransportSecurity {
    pub fn new(max_age_seconds: i64, include_sub_domains: bool, preload: bool) -> Self {
        let rendered = render_hsts(max_age_seconds, include_sub_domains, preload);
        // Digits, ASCII letters, '-', ';', '=' and spaces only.
        let value = HeaderValue::from_str(&rendered)
            .unwrap_or_else(|_| HeaderValue::from_static("max-age=31536000; includeSubDomains; "));
        Self { value }
    }

    pub fn value(&self) -> &HeaderValue {
        &self.value
    }
}

impl Default for StrictTransportSecurity {
    fn default() -> Self {
        Self::from(&HstsConfig::default())
    }
}

impl From<&HstsConfig> for StrictTransportSecurity {
    fn from(config: &HstsConfig) -> Self {
        Self::new(config.max_age_seconds, config.include_sub_domains, config.preload)
    }
}

/// Render the header value. Each present directive is followed by `"; "`
/// except `preload`, so trailing separators are part of the output.
pub fn render_hsts(max_age_seconds: i64, include_sub_domains: bool, preload: bool) -> String {
    format!(
        "max-age={}; {}{}",
        max_age_seconds,
        if include_sub_domains { "includeSubDomains; " } else { "" },
        if preload { "preload" } else { "" },
    )
}

/// Transport security stage.
pub async fn strict_transport_security(
    State(hsts): State<StrictTransportSecurity>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(STRICT_TRANSPORT_SECURITY, hsts.value.clone());
    response
}
