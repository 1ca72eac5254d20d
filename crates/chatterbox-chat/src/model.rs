//! Domain records.
//!
//! The JSON shapes match what the front end expects:
//!
//! | Record | JSON |
//! |---|---|
//! | [`Message`] | `{"content": "...", "timestamp": "1712345678.5", "user": "john"}` |
//! | [`User`] | `{"name": "john", "about": null}` |
//! | [`Invite`] | `{"code": "a1b2c3d4", "accepter": null}` |
//!
//! Passwords and inviters are never serialised.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A chat message.
///
/// The timestamp is the message's identity and sort key; a store keeps
/// timestamps strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message text, never empty.
    pub content: String,

    /// Seconds since the Unix epoch.
    #[serde(with = "timestamp_string")]
    pub timestamp: f64,

    /// Name of the author.
    #[serde(rename = "user")]
    pub author: String,
}

impl Message {
    /// Creates a message.
    pub fn new(timestamp: f64, author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            timestamp,
            author: author.into(),
        }
    }

    /// Creates a message stamped with the current time.
    pub fn now(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(now_timestamp(), author, content)
    }
}

/// Current time as fractional seconds since the Unix epoch.
#[must_use]
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Timestamps travel as strings so clients do not lose precision.
mod timestamp_string {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique name.
    pub name: String,

    /// Opaque credential.
    #[serde(skip)]
    pub password: String,

    /// Free-form profile text.
    pub about: Option<String>,
}

impl User {
    /// Creates a user without profile text.
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            about: None,
        }
    }

    /// Sets the profile text.
    #[must_use]
    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }
}

/// An invite code, redeemable once to sign up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    /// Unique code.
    pub code: String,

    /// Name of the user who created the invite.
    #[serde(skip)]
    pub inviter: String,

    /// Name of the user who redeemed it.
    pub accepter: Option<String>,
}

impl Invite {
    /// Length of generated codes.
    pub const CODE_LEN: usize = 8;

    /// Creates an unredeemed invite.
    pub fn new(inviter: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            inviter: inviter.into(),
            accepter: None,
        }
    }

    /// Creates an invite with a fresh random code.
    pub fn generate(inviter: impl Into<String>) -> Self {
        Self::new(inviter, generate_code())
    }

    /// Returns true if the invite can still be redeemed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.accepter.is_none()
    }
}

/// Eight alphanumeric characters from the random tail of a v7 UUID.
fn generate_code() -> String {
    let id = uuid::Uuid::now_v7().simple().to_string();
    id[id.len() - Invite::CODE_LEN..].to_string()
}
