//! Ordered endpoint table for Chatterbox.
//!
//! This crate maps already-split request paths to endpoints. Each endpoint
//! pairs a path template with a per-method handler table, and endpoints are
//! tried in the order they were registered.
//!
//! # Features
//!
//! - **Path templates**: literal segments plus `{name}` captures that match
//!   exactly one segment
//! - **First match wins**: no specificity ranking, registration order decides
//! - **Method synthesis**: `HEAD` falls back to `GET`, `OPTIONS` is always
//!   answered, anything else yields a method-not-allowed outcome
//! - **Precomputed `Allow`**: built once per endpoint
//!
//! # Example
//!
//! ```rust
//! use chatterbox_router::{MethodOutcome, MethodTable, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router
//!     .insert(
//!         "/api/v1/communities/{community}/channels/{channel}/messages",
//!         MethodTable::new().get("listMessages").post("createMessage"),
//!     )
//!     .unwrap();
//!
//! let path: Vec<String> = "api/v1/communities/_/channels/_/messages"
//!     .split('/')
//!     .map(String::from)
//!     .collect();
//!
//! let (outcome, captures) = router.match_route(&Method::HEAD, &path).unwrap();
//! assert_eq!(outcome, MethodOutcome::HeadViaGet(&"listMessages"));
//! assert_eq!(captures.len(), 2);
//! ```

mod captures;
mod error;
mod method_table;
mod router;
mod template;

pub use captures::Captures;
pub use error::TemplateError;
pub use method_table::{MethodOutcome, MethodTable};
pub use router::{Endpoint, Resolved, Router};
pub use template::{Segment, Template};
