//! Application routes served behind the pipeline.

use axum::{routing::get, Router};

/// The application's routes.
pub fn routes() -> Router {
    Router::new().route("/", get(hello))
}

async fn hello() -> &'static str {
    "Hello World!"
}
