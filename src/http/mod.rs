//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, HTTP/1.1 + HTTP/2 via hyper-util)
//!     → request.rs (request ID, tracing span)
//!     → pipeline.rs (ordered stages, see security/ for the guards)
//!     → boundary.rs (failure → JSON envelope)
//!     → redirect.rs (HTTPS redirection)
//!     → application routes; validation.rs filters bound input per endpoint
//! ```

pub mod boundary;
pub mod pipeline;
pub mod redirect;
pub mod request;
pub mod server;
pub mod validation;

pub use pipeline::PipelineSettings;
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
pub use validation::{validate_model, ModelState, ValidatedJson, ValidationRejection};
