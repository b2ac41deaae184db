//! Hardened HTTP server library: an ordered chain of security stages,
//! a global exception boundary and a model validation filter around an
//! axum application router.

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;

pub use config::GuardConfig;
pub use error::{AppError, Failure, FailureKind};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
