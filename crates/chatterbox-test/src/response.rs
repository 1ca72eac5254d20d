//! Collected responses and their assertions.
//!
//! Assertions panic with the response body in the message and return
//! `&Self`, so they chain.

use std::fmt;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TestError;

/// A response whose body has been read to the end.
#[derive(Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Collects an HTTP response, reading its body to the end.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::BodyRead`] if the body stream fails, which is
    /// how an aborted handler response shows up.
    pub async fn from_http<B>(response: http::Response<B>) -> Result<Self, TestError>
    where
        B: BodyExt,
        B::Error: fmt::Display,
    {
        let (parts, body) = response.into_parts();
        let collected = body
            .collect()
            .await
            .map_err(|e| TestError::BodyRead(e.to_string()))?;

        Ok(Self::new(parts.status, parts.headers, collected.to_bytes()))
    }

    /// Creates a response from its parts.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns true for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header as a string, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::BodyRead`] if the body is not valid UTF-8.
    pub fn text(&self) -> Result<&str, TestError> {
        std::str::from_utf8(&self.body).map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body is not the expected JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserializes the JSON body into a [`Value`].
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body is not JSON.
    pub fn json_value(&self) -> Result<Value, TestError> {
        self.json()
    }

    fn body_for_panic(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn json_or_panic(&self) -> Value {
        self.json_value()
            .unwrap_or_else(|e| panic!("body is not JSON ({e}): {}", self.body_for_panic()))
    }

    /// Asserts the status.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "unexpected status, body: {}",
            self.body_for_panic()
        );
        self
    }

    /// Asserts the status by number.
    pub fn assert_status_code(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "unexpected status, body: {}",
            self.body_for_panic()
        );
        self
    }

    /// Asserts a 2xx status.
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.is_success(),
            "expected success, got {}: {}",
            self.status,
            self.body_for_panic()
        );
        self
    }

    /// Asserts that header `name` is present with value `expected`.
    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        match self.header(name) {
            Some(actual) => assert_eq!(actual, expected, "header '{name}'"),
            None => panic!("header '{name}' missing, have {:?}", self.headers),
        }
        self
    }

    /// Asserts the media type; parameters such as `charset` are ignored.
    pub fn assert_content_type(&self, expected: &str) -> &Self {
        let actual = self.content_type().unwrap_or_default();
        let media_type = actual.split(';').next().unwrap_or_default().trim();
        assert_eq!(media_type, expected, "Content-Type was '{actual}'");
        self
    }

    /// Asserts the exact body text.
    pub fn assert_body_eq(&self, expected: &str) -> &Self {
        assert_eq!(self.body_for_panic(), expected);
        self
    }

    /// Asserts the whole JSON body.
    pub fn assert_json_eq(&self, expected: &Value) -> &Self {
        assert_eq!(&self.json_or_panic(), expected);
        self
    }

    /// Asserts one JSON field, addressed by a dotted path such as
    /// `messages.0.user`.
    pub fn assert_json_field(&self, path: &str, expected: &Value) -> &Self {
        let json = self.json_or_panic();
        let pointer = dotted_to_pointer(path);
        match json.pointer(&pointer) {
            Some(actual) => assert_eq!(actual, expected, "JSON field '{path}'"),
            None => panic!("JSON field '{path}' missing in {json}"),
        }
        self
    }

    /// Asserts an error body of the form `{"message": expected}`.
    pub fn assert_message(&self, expected: &str) -> &Self {
        self.assert_json_eq(&serde_json::json!({ "message": expected }))
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// `a.0.b` -> `/a/0/b`
fn dotted_to_pointer(path: &str) -> String {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .fold(String::new(), |mut pointer, segment| {
            pointer.push('/');
            pointer.push_str(&segment.replace('~', "~0").replace('/', "~1"));
            pointer
        })
}
