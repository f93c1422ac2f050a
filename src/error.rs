//! Error types.
//!
//! Two families live here. [`ApiError`] is the request-level taxonomy: every
//! core function fails with exactly one of its kinds, and the dispatch
//! boundary turns it into a status code plus a failure envelope. [`Error`]
//! covers infrastructure failures (binding a port, loading configuration)
//! that never reach a client.

use thiserror::Error;

use crate::status::Status;

/// A request-level failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The addressed record or route does not exist.
    #[error("{0}")]
    NotFound(String),

    /// One or more input fields were rejected, in field order.
    #[error("{}", .0.join(", "))]
    ValidationFailed(Vec<String>),

    /// The credential was missing or did not match.
    #[error("{0}")]
    Unauthenticated(String),

    /// The method is not served at all.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The request body is larger than the configured cap, in bytes.
    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    /// Anything unexpected. The message is safe to show to clients.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::ValidationFailed(vec![message.into()])
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The HTTP status this failure is rendered with.
    pub fn status(&self) -> Status {
        match self {
            Self::NotFound(_)         => Status::NotFound,
            Self::ValidationFailed(_) => Status::BadRequest,
            Self::Unauthenticated(_)  => Status::Unauthorized,
            Self::MethodNotAllowed    => Status::MethodNotAllowed,
            Self::PayloadTooLarge(_)  => Status::PayloadTooLarge,
            Self::Internal(_)         => Status::InternalServerError,
        }
    }
}

/// Infrastructure failure: listener I/O, unreadable configuration, or a
/// logging subscriber that could not be installed.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(Box<figment::Error>),

    #[error("telemetry: {0}")]
    Telemetry(String),
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Self::Config(Box::new(e))
    }
}
