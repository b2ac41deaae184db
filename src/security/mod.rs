//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (non-development):
//!     → headers.rs (security header bundle)
//!     → hsts.rs (Strict-Transport-Security)
//!     → headers.rs (Permissions-Policy)
//!     → cors.rs (cross-origin headers)
//!     → limits.rs (declared size check, may short-circuit with 413)
//!     → Pass to exception boundary
//! ```
//!
//! # Design Decisions
//! - Header stages post-process: they write after the inner stages return,
//!   overwriting, so every response carries them exactly once
//! - Stage parameters are built once from config and injected as state

pub mod cors;
pub mod headers;
pub mod hsts;
pub mod limits;

pub use cors::{cross_origin_policy, CrossOriginPolicy};
pub use headers::{permissions_policy, security_headers};
pub use hsts::{strict_transport_security, StrictTransportSecurity};
pub use limits::{request_size_guard, RequestSizeLimit};
