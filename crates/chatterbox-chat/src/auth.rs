//! HTTP Basic authentication.
//!
//! [`authorize`] decodes the `Authorization` header and asks an
//! [`Authenticator`] to check the credentials:
//!
//! | Header | Result |
//! |---|---|
//! | absent | `401 "Unauthorized."` |
//! | scheme other than `Basic` | `400 "Unknown authorization type."` |
//! | value that is not base64 of UTF-8 | `400 "Invalid credentials."` |
//! | not `name:password`, unknown user or wrong password | `400 "Bad credentials."` |

use std::sync::{Arc, OnceLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http::header::AUTHORIZATION;
use http::HeaderMap;
use regex::Regex;

use crate::error::{ApiError, ApiResult, StoreError};
use crate::model::User;
use crate::store::ChatStore;

const UNKNOWN_TYPE: &str = "Unknown authorization type.";
const INVALID_CREDENTIALS: &str = "Invalid credentials.";
const BAD_CREDENTIALS: &str = "Bad credentials.";

/// Checks a name and password.
pub trait Authenticator: Send + Sync {
    /// Returns the user if the credentials match, `None` if they do not.
    fn authenticate(&self, name: &str, password: &str) -> Result<Option<User>, StoreError>;
}

/// Compares credentials against the user records of a [`ChatStore`].
#[derive(Clone)]
pub struct StoreAuthenticator {
    store: Arc<dyn ChatStore>,
}

impl StoreAuthenticator {
    /// Creates an authenticator backed by `store`.
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for StoreAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreAuthenticator").finish_non_exhaustive()
    }
}

impl Authenticator for StoreAuthenticator {
    fn authenticate(&self, name: &str, password: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .store
            .user(name)?
            .filter(|user| user.password == password))
    }
}

/// Name and password decoded from a Basic `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User name.
    pub name: String,
    /// Password, possibly empty.
    pub password: String,
}

impl Credentials {
    /// Decodes an `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::BadCredentials`] with the message for the first
    /// check that fails.
    pub fn parse(header: &str) -> ApiResult<Self> {
        let (scheme, encoded) = header
            .split_once(' ')
            .ok_or_else(|| ApiError::bad_credentials(INVALID_CREDENTIALS))?;
        if scheme != "Basic" {
            return Err(ApiError::bad_credentials(UNKNOWN_TYPE));
        }

        let decoded = STANDARD
            .decode(encoded.trim())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| ApiError::bad_credentials(INVALID_CREDENTIALS))?;

        let captures = credentials_pattern()
            .captures(&decoded)
            .ok_or_else(|| ApiError::bad_credentials(BAD_CREDENTIALS))?;
        Ok(Self {
            name: captures[1].to_string(),
            password: captures[2].to_string(),
        })
    }
}

fn credentials_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\w+):(.*)$").expect("valid regex"))
}

/// Authenticates the caller of a request.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] without a header,
/// [`ApiError::BadCredentials`] for unusable or wrong credentials, and
/// [`ApiError::Store`] if the lookup fails.
pub fn authorize(headers: &HeaderMap, authenticator: &dyn Authenticator) -> ApiResult<User> {
    let header = headers.get(AUTHORIZATION).ok_or(ApiError::Unauthorized)?;
    let header = header
        .to_str()
        .map_err(|_| ApiError::bad_credentials(INVALID_CREDENTIALS))?;
    let credentials = Credentials::parse(header)?;

    authenticator
        .authenticate(&credentials.name, &credentials.password)?
        .ok_or_else(|| {
            tracing::debug!(user = %credentials.name, "rejected credentials");
            ApiError::bad_credentials(BAD_CREDENTIALS)
        })
}
