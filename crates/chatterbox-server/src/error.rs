//! Server error types.

use std::path::PathBuf;

use chatterbox_router::TemplateError;
use thiserror::Error;

/// Errors raised while building or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the configured address.
    #[error("bind error: {0}")]
    Bind(String),

    /// An endpoint template could not be parsed.
    #[error("invalid route: {0}")]
    Route(#[from] TemplateError),

    /// A static front-end file could not be loaded.
    #[error("static file error: {0}")]
    Static(#[from] StaticFileError),

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading static front-end routes.
#[derive(Debug, Error)]
pub enum StaticFileError {
    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The file that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The route map is not a JSON object of strings.
    #[error("invalid front-end map {path}: {source}")]
    InvalidMap {
        /// The map file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A mapped file name would escape the assets directory.
    #[error("forbidden asset path: {0}")]
    Forbidden(String),
}
