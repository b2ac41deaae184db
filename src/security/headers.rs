//! Fixed security response headers.
//!
//! # Responsibilities
//! - Content sniffing, framing, XSS filter and referrer headers
//! - Content-Security-Policy locked to same-origin resources
//! - Permissions-Policy denying device and payment features
//!
//! # Design Decisions
//! - Values are static; every insert overwrites any earlier value
//! - Headers are applied after the inner service returns, so they cover
//!   short-circuit responses from inner stages too. A handler cannot relax
//!   them: its own `X-Frame-Options` is replaced

use axum::{
    extract::Request,
    http::{
        header::{CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION},
        HeaderMap, HeaderName, HeaderValue,
    },
    middleware::Next,
    response::Response,
};

pub const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

const CSP: &str = "default-src 'self'; script-src 'self'; style-src 'self'; img-src 'self'; font-src 'self'; connect-src 'self'";
const PERMISSIONS: &str = "geolocation=(), camera=(), microphone=(), fullscreen=(), payment=()";

/// Set the fixed security header bundle on `headers`.
///
/// HTTP/1 connections write header names in title case, so
/// `X-XSS-Protection` reaches clients as `X-Xss-Protection`. Names are
/// case-insensitive; HTTP/2 sends them lowercase.
pub fn apply_security_headers(headers: &mut HeaderMap) {
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static(CSP));
}

/// Security header stage.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    apply_security_headers(response.headers_mut());
    response
}

/// Permissions policy stage.
pub async fn permissions_policy(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(PERMISSIONS_POLICY, HeaderValue::from_static(PERMISSIONS));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .route(
                "/framed",
                get(|| async { ([(X_FRAME_OPTIONS, "SAMEORIGIN")], "framed") }),
            )
            .layer(middleware::from_fn(permissions_policy))
            .layer(middleware::from_fn(security_headers))
    }

    async fn get_headers(uri: &str) -> HeaderMap {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.headers().clone()
    }

    #[tokio::test]
    async fn sets_exact_values() {
        let headers = get_headers("/").await;
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["x-xss-protection"], "1; mode=block");
        assert_eq!(headers["referrer-policy"], "no-referrer");
        assert_eq!(headers["content-security-policy"], CSP);
        assert_eq!(
            headers["permissions-policy"],
            "geolocation=(), camera=(), microphone=(), fullscreen=(), payment=()"
        );
    }

    #[tokio::test]
    async fn overwrites_handler_values() {
        let headers = get_headers("/framed").await;
        let values: Vec<_> = headers.get_all(X_FRAME_OPTIONS).iter().collect();
        assert_eq!(values, vec!["DENY"]);
    }

    #[tokio::test]
    async fn applies_to_unmatched_routes() {
        let response = app()
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    }

    #[test]
    fn applying_twice_does_not_duplicate() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers);
        apply_security_headers(&mut headers);
        assert_eq!(headers.len(), 5);
        assert_eq!(headers.get_all(CONTENT_SECURITY_POLICY).iter().count(), 1);
    }
}
