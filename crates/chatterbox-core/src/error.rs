//! Error types for jobs and routing.
//!
//! [`ProtocolError`] is raised when a handler misuses a [`Job`](crate::Job),
//! for example by writing a body before the head. It is always a bug in the
//! handler. [`JobError`] wraps it together with the conditions a correct
//! handler can still run into, such as the client going away.

use thiserror::Error;

/// Result type alias using [`JobError`].
pub type JobResult<T> = Result<T, JobError>;

/// Boxed error type carried by request bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Misuse of the job response protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// `write_head` was called a second time.
    #[error("response head already written")]
    HeadAlreadyWritten,

    /// Body bytes were written before the head.
    #[error("response head not written yet")]
    HeadNotWritten,

    /// The body was already closed.
    #[error("response body already closed")]
    BodyClosed,

    /// The request body was already consumed.
    #[error("request body already read")]
    BodyAlreadyRead,

    /// The status is an unknown code or a malformed status line.
    #[error("invalid status: {0}")]
    InvalidStatus(String),
}

/// Errors returned by [`Job`](crate::Job) operations.
#[derive(Debug, Error)]
pub enum JobError {
    /// The handler broke the response protocol.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The receiving side of the response is gone.
    #[error("client disconnected")]
    Disconnected,

    /// The job was dropped before a response head was written.
    #[error("job dropped before writing a response head")]
    Abandoned,

    /// The request body exceeded the configured limit.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge {
        /// The configured limit in bytes.
        limit: usize,
    },

    /// Reading the request body failed.
    #[error("failed to read request body: {0}")]
    Body(String),

    /// JSON (de)serialisation failed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl JobError {
    /// Returns true if this is a [`ProtocolError`].
    #[must_use]
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Returns true if the client went away.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}

/// Failure to turn an incoming request into a routable job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// No endpoint matches the path.
    #[error("no endpoint for {0}")]
    NotFound(String),

    /// The request target could not be decoded.
    #[error("unroutable request target: {0}")]
    Unroutable(String),
}

/// Yielded by a [`JobBody`](crate::JobBody) whose job was dropped mid-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("response stream aborted before completion")]
pub struct StreamAborted;
