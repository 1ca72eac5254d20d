//! Chat error types.
//!
//! [`ApiError`] is the only error an API handler produces. It is turned
//! into a status code and a `{"message": ...}` body once, when the handler
//! replies.

use chatterbox_server::ServerError;
use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Message sent for every server-side failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error.";

/// Failures reported by a [`ChatStore`](crate::ChatStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A record violated a store constraint.
    #[error("store conflict: {0}")]
    Conflict(String),
}

/// Errors raised while assembling the application.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Routes or static files could not be registered.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Seeding the store failed.
    #[error("failed to seed store: {0}")]
    Store(#[from] StoreError),
}

/// Errors surfaced to API clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad query parameter or body.
    #[error("{0}")]
    Validation(String),

    /// No credentials were sent.
    #[error("Unauthorized.")]
    Unauthorized,

    /// The credentials were malformed or did not match.
    #[error("{0}")]
    BadCredentials(String),

    /// The operation is not permitted.
    #[error("{0}")]
    Forbidden(String),

    /// The requested record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Any other server-side failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a bad credentials error.
    pub fn bad_credentials(message: impl Into<String>) -> Self {
        Self::BadCredentials(message.into())
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadCredentials(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message shown to the client.
    ///
    /// Server-side failures never leak their details.
    #[must_use]
    pub fn client_message(&self) -> String {
        if self.is_server_error() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }

    /// Returns true for failures that are not the client's fault.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Internal(_))
    }
}
