//! Ordered middleware pipeline.
//!
//! # Stage order (outermost first)
//! ```text
//! request id → trace span
//!   [production]  security headers → HSTS → permissions policy → CORS → size guard
//!   [development] developer diagnostics page
//!   exception boundary → panic capture
//!   HTTPS redirection
//!   application routes (validation filter runs per endpoint)
//! ```
//!
//! Every stage receives the request and a `Next` continuation. A stage that
//! returns without calling `Next` ends the chain for that request, and outer
//! stages only post-process what it returned.

use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GuardConfig;
use crate::http::boundary::{developer_page, exception_boundary, raise_panic};
use crate::http::redirect::{https_redirection, HttpsRedirection};
use crate::http::request::{request_span, X_REQUEST_ID};
use crate::security::{
    cross_origin_policy, permissions_policy, request_size_guard, security_headers,
    strict_transport_security, CrossOriginPolicy, RequestSizeLimit, StrictTransportSecurity,
};

/// Stage parameters derived once from configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub development: bool,
    pub hsts: StrictTransportSecurity,
    pub cors: CrossOriginPolicy,
    pub size_limit: RequestSizeLimit,
    pub redirect: HttpsRedirection,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            development: false,
            hsts: StrictTransportSecurity::default(),
            cors: CrossOriginPolicy::default(),
            size_limit: RequestSizeLimit::default(),
            redirect: HttpsRedirection::default(),
        }
    }
}

impl From<&GuardConfig> for PipelineSettings {
    fn from(config: &GuardConfig) -> Self {
        let cors = CrossOriginPolicy::try_from(&config.cors).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid CORS configuration, using defaults");
            CrossOriginPolicy::default()
        });

        Self {
            development: config.environment.is_development(),
            hsts: StrictTransportSecurity::from(&config.hsts),
            cors,
            size_limit: RequestSizeLimit::new(config.limits.max_request_bytes),
            redirect: HttpsRedirection::new(config.server.https_port),
        }
    }
}

/// Wrap application routes in the full stage chain.
///
/// `Router::layer` wraps outward, so layers are added innermost first.
pub fn build(routes: Router, settings: &PipelineSettings) -> Router {
    if settings.redirect.https_port.is_none() {
        tracing::warn!("HTTPS port not configured; HTTPS redirection is disabled");
    }

    let mut app = routes
        .layer(middleware::from_fn_with_state(settings.redirect, https_redirection))
        .layer(CatchPanicLayer::custom(raise_panic))
        .layer(middleware::from_fn(exception_boundary));

    if settings.development {
        app = app.layer(CatchPanicLayer::custom(developer_page));
    } else {
        app = app
            .layer(middleware::from_fn_with_state(settings.size_limit, request_size_guard))
            .layer(middleware::from_fn_with_state(settings.cors.clone(), cross_origin_policy))
            .layer(middleware::from_fn(permissions_policy))
            .layer(middleware::from_fn_with_state(settings.hsts.clone(), strict_transport_security))
            .layer(middleware::from_fn(security_headers));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
    )
}
