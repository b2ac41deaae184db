//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (HTTP/1 + HTTP/2 serving, graceful drain)
//!     → Hand off to the HTTP pipeline
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - TLS terminates in front of this server

pub mod connection;
pub mod listener;

pub use connection::{spawn_connection, ConnectionId};
pub use listener::{ConnectionPermit, Listener, ListenerError};
