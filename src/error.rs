//! Application failures and their classification.
//!
//! Handlers raise failures either by returning `Err(AppError)` or by
//! panicking. Both become a [`Failure`] carried in the response extensions
//! until the exception boundary renders it.

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt::Write as _;
use std::io;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Classification tag selecting the status code for an unhandled failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FailureKind {
    UnauthorizedAccess,
    InvalidArgument,
    NotFound,
    Other,
}

impl FailureKind {
    /// Status code for this kind of failure.
    pub fn status_code(self) -> StatusCode {
        match self {
            FailureKind::UnauthorizedAccess => StatusCode::UNAUTHORIZED,
            FailureKind::InvalidArgument => StatusCode::BAD_REQUEST,
            FailureKind::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::UnauthorizedAccess => "unauthorized_access",
            FailureKind::InvalidArgument => "invalid_argument",
            FailureKind::NotFound => "not_found",
            FailureKind::Other => "other",
        }
    }

    /// Classify an I/O error by its kind.
    pub fn of_io(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::PermissionDenied => FailureKind::UnauthorizedAccess,
            io::ErrorKind::InvalidInput => FailureKind::InvalidArgument,
            io::ErrorKind::NotFound => FailureKind::NotFound,
            _ => FailureKind::Other,
        }
    }
}

/// An unhandled failure on its way to the exception boundary.
#[derive(Debug, Clone)]
pub struct Failure {
    pub kind: FailureKind,
    /// Name reported in the `Error` field.
    pub name: String,
    pub message: String,
    /// Diagnostic trace reported in the `Details` field.
    pub details: String,
}

impl Failure {
    pub fn new(kind: FailureKind, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            message: message.into(),
            details: String::new(),
        }
    }

    /// Build a failure from any error, recording its source chain and a
    /// backtrace when capture is enabled.
    pub fn from_error(kind: FailureKind, name: impl Into<String>, err: &(dyn StdError + 'static)) -> Self {
        let mut failure = Self::new(kind, name, err.to_string());
        failure.details = diagnostic_trace(&failure.name, err, &Backtrace::capture());
        failure
    }

    /// Build a failure from a caught panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with a non-string payload".to_string()
        };
        let details = format!("thread panicked while processing the request: {}", message);
        Self {
            kind: FailureKind::Other,
            name: "Panic".to_string(),
            message,
            details,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    /// Raise this failure: a bodiless response tagged for the boundary.
    pub fn into_raised_response(self) -> Response {
        let mut response = self.status_code().into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// `name: message`, one `caused by:` line per source, then the backtrace.
///
/// A source that displays the same text as the error wrapping it adds
/// nothing and is skipped.
fn diagnostic_trace(name: &str, err: &(dyn StdError + 'static), backtrace: &Backtrace) -> String {
    let mut previous = err.to_string();
    let mut out = format!("{}: {}", name, previous);
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if text != previous {
            let _ = write!(out, "\ncaused by: {}", text);
        }
        previous = text;
        source = cause.source();
    }
    if backtrace.status() == BacktraceStatus::Captured {
        let _ = write!(out, "\n{}", backtrace);
    }
    out
}

/// Errors returned by application handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    UnauthorizedAccess(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("{source}")]
    Internal {
        name: &'static str,
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl AppError {
    /// Wrap an arbitrary error; its type name becomes the reported name.
    pub fn internal<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let full = std::any::type_name::<E>();
        let name = full.rsplit("::").next().unwrap_or(full);
        AppError::Internal {
            name,
            source: Box::new(err),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            AppError::UnauthorizedAccess(_) => FailureKind::UnauthorizedAccess,
            AppError::InvalidArgument(_) => FailureKind::InvalidArgument,
            AppError::NotFound(_) => FailureKind::NotFound,
            AppError::Io(e) => FailureKind::of_io(e.kind()),
            AppError::Internal { .. } => FailureKind::Other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AppError::UnauthorizedAccess(_) => "UnauthorizedAccess",
            AppError::InvalidArgument(_) => "InvalidArgument",
            AppError::NotFound(_) => "NotFound",
            AppError::Io(_) => "IoError",
            AppError::Internal { name, .. } => name,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        Failure::from_error(self.kind(), self.name(), &self).into_raised_response()
    }
}
