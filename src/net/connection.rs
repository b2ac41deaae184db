//! Per-connection serving.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Serve HTTP/1.1 and HTTP/2 on one socket
//! - Register each connection for graceful drain

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{http::Request, Router};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::{conn::auto, graceful::GracefulShutdown},
};
use tokio::net::TcpStream;
use tower::Service;

use crate::net::listener::ConnectionPermit;

/// Relaxed ordering is enough; only uniqueness matters.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Serve one accepted connection on a background task.
///
/// HTTP/1 header names are written in title case.
pub fn spawn_connection(
    stream: TcpStream,
    peer: SocketAddr,
    permit: ConnectionPermit,
    app: Router,
    graceful: &GracefulShutdown,
) -> ConnectionId {
    let id = ConnectionId::new();

    let service = hyper::service::service_fn(move |request: Request<Incoming>| {
        app.clone().call(request)
    });

    let mut builder = auto::Builder::new(TokioExecutor::new());
    builder.http1().title_case_headers(true);

    let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
    let conn = graceful.watch(conn.into_owned());

    tokio::spawn(async move {
        let _permit = permit;
        tracing::trace!(connection_id = %id, peer_addr = %peer, "Connection opened");
        if let Err(e) = conn.await {
            tracing::debug!(connection_id = %id, peer_addr = %peer, error = %e, "Connection error");
        }
        tracing::trace!(connection_id = %id, "Connection closed");
    });

    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id2.as_u64() > id1.as_u64());
        assert_eq!(format!("{}", ConnectionId(7)), "conn-7");
    }
}
