//! Static front-end routes.
//!
//! Front-end files are read once at startup and served from memory. The
//! route map is a JSON object from request path to a file name relative to
//! an assets directory:
//!
//! ```json
//! {
//!     "/": "index.html",
//!     "/login": "index.html",
//!     "/main.js": "main.js"
//! }
//! ```
//!
//! # Security
//!
//! Mapped file names may not be absolute or contain `..` components.

use std::fs;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use indexmap::IndexMap;

use crate::error::StaticFileError;
use crate::handler::{handler_fn, Handler};

/// A fixed payload with its content type.
#[derive(Debug, Clone)]
pub struct StaticAsset {
    content_type: HeaderValue,
    payload: Bytes,
}

impl StaticAsset {
    /// Creates an asset from a content type and payload.
    ///
    /// A content type that is not valid header text falls back to
    /// `application/octet-stream`.
    pub fn new(content_type: &str, payload: impl Into<Bytes>) -> Self {
        Self {
            content_type: HeaderValue::from_str(content_type)
                .unwrap_or_else(|_| HeaderValue::from_static(OCTET_STREAM)),
            payload: payload.into(),
        }
    }

    /// Reads a file, guessing its content type from the extension.
    ///
    /// # Errors
    ///
    /// Returns [`StaticFileError::Read`] if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self, StaticFileError> {
        let payload = fs::read(path).map_err(|source| StaticFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            content_type: HeaderValue::from_static(detect_mime_type(path)),
            payload: Bytes::from(payload),
        })
    }

    /// Returns the content type.
    #[must_use]
    pub fn content_type(&self) -> &HeaderValue {
        &self.content_type
    }

    /// Returns the payload.
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Headers sent with the asset.
    #[must_use]
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(CONTENT_TYPE, self.content_type.clone());
        headers.insert(CONTENT_LENGTH, HeaderValue::from(self.payload.len()));
        headers
    }

    /// Turns the asset into a handler answering `200` with the payload.
    #[must_use]
    pub fn into_handler(self) -> Handler {
        let headers = self.headers();
        let payload = self.payload;
        handler_fn(move |mut job, _| {
            let headers = headers.clone();
            let payload = payload.clone();
            async move {
                let result = job
                    .write_head(200, headers)
                    .and_then(|()| job.close_body_with(payload));
                if let Err(e) = result {
                    tracing::debug!(error = %e, "static response not delivered");
                }
            }
        })
    }
}

/// Loads the front-end route map and every file it names.
///
/// Routes keep the order of the map file.
///
/// # Errors
///
/// Returns [`StaticFileError`] if the map or any mapped file cannot be read,
/// or a file name escapes `assets_dir`.
pub fn load_frontend_map(
    map_file: &Path,
    assets_dir: &Path,
) -> Result<Vec<(String, StaticAsset)>, StaticFileError> {
    let raw = fs::read_to_string(map_file).map_err(|source| StaticFileError::Read {
        path: map_file.to_path_buf(),
        source,
    })?;
    let map: IndexMap<String, String> =
        serde_json::from_str(&raw).map_err(|source| StaticFileError::InvalidMap {
            path: map_file.to_path_buf(),
            source,
        })?;

    let mut routes = Vec::with_capacity(map.len());
    for (route, file) in map {
        let path = resolve_asset(assets_dir, &file)?;
        routes.push((route, StaticAsset::from_file(&path)?));
    }
    tracing::info!(count = routes.len(), map = %map_file.display(), "loaded front-end routes");
    Ok(routes)
}

fn resolve_asset(assets_dir: &Path, file: &str) -> Result<PathBuf, StaticFileError> {
    let relative = Path::new(file);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(StaticFileError::Forbidden(file.to_string()));
    }
    Ok(assets_dir.join(relative))
}

const OCTET_STREAM: &str = "application/octet-stream";

/// Guesses a MIME type from a file extension.
#[must_use]
pub fn detect_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "txt" => "text/plain; charset=utf-8",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",

        // Web
        "wasm" => "application/wasm",
        "webmanifest" => "application/manifest+json",

        _ => OCTET_STREAM,
    }
}
