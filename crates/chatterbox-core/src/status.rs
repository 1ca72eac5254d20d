//! Response status values.
//!
//! Handlers pass either a bare numeric code or a preformatted status line
//! such as `"404 Not Found"`. Both are normalised into a [`Status`].

use std::borrow::Cow;
use std::fmt;

use http::StatusCode;

use crate::error::ProtocolError;

/// A validated response status: code plus reason phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: StatusCode,
    reason: Cow<'static, str>,
}

impl Status {
    /// Builds a status from a numeric code with a known reason phrase.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidStatus`] for codes outside `100..=999`
    /// or codes without a canonical reason phrase.
    pub fn from_code(code: u16) -> Result<Self, ProtocolError> {
        let code = StatusCode::from_u16(code)
            .map_err(|_| ProtocolError::InvalidStatus(code.to_string()))?;
        let reason = code
            .canonical_reason()
            .ok_or_else(|| ProtocolError::InvalidStatus(code.as_str().to_string()))?;
        Ok(Self {
            code,
            reason: Cow::Borrowed(reason),
        })
    }

    /// Parses a `"<code> <reason>"` status line.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidStatus`] if the code is not three
    /// digits in `100..=999` or the reason phrase is missing.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let invalid = || ProtocolError::InvalidStatus(line.to_string());

        let (code, reason) = line.trim().split_once(' ').ok_or_else(invalid)?;
        let reason = reason.trim();
        if code.len() != 3 || reason.is_empty() {
            return Err(invalid());
        }
        let code = StatusCode::from_bytes(code.as_bytes()).map_err(|_| invalid())?;

        Ok(Self {
            code,
            reason: Cow::Owned(reason.to_string()),
        })
    }

    /// Returns the status code.
    #[must_use]
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// Returns the numeric status code.
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.code.as_u16()
    }

    /// Returns the reason phrase as given (or the canonical one).
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<StatusCode> for Status {
    fn from(code: StatusCode) -> Self {
        Self {
            code,
            reason: Cow::Borrowed(code.canonical_reason().unwrap_or("")),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code.as_str(), self.reason)
    }
}

/// Conversion into a [`Status`] accepted by [`Job::write_head`](crate::Job::write_head).
pub trait IntoStatus {
    /// Performs the conversion.
    fn into_status(self) -> Result<Status, ProtocolError>;
}

impl IntoStatus for Status {
    fn into_status(self) -> Result<Status, ProtocolError> {
        Ok(self)
    }
}

impl IntoStatus for StatusCode {
    fn into_status(self) -> Result<Status, ProtocolError> {
        Ok(Status::from(self))
    }
}

impl IntoStatus for u16 {
    fn into_status(self) -> Result<Status, ProtocolError> {
        Status::from_code(self)
    }
}

// Unsuffixed literals such as `write_head(200, ..)` default to `i32`.
impl IntoStatus for i32 {
    fn into_status(self) -> Result<Status, ProtocolError> {
        let code =
            u16::try_from(self).map_err(|_| ProtocolError::InvalidStatus(self.to_string()))?;
        Status::from_code(code)
    }
}

impl IntoStatus for &str {
    fn into_status(self) -> Result<Status, ProtocolError> {
        Status::parse(self)
    }
}

impl IntoStatus for String {
    fn into_status(self) -> Result<Status, ProtocolError> {
        Status::parse(&self)
    }
}
