//! # Chatterbox Test
//!
//! In-memory HTTP testing for Chatterbox endpoints. Requests are handed
//! straight to a [`Dispatcher`](chatterbox_server::Dispatcher), so no port
//! is bound.
//!
//! - [`TestClient`] - Builds and sends requests
//! - [`TestRequest`] - Standalone request builder
//! - [`TestResponse`] - Collected response with assertion helpers
//!
//! ## Example
//!
//! ```rust
//! use chatterbox_core::Job;
//! use chatterbox_router::{Captures, MethodTable};
//! use chatterbox_server::{handler_fn, Routes};
//! use chatterbox_test::TestClient;
//!
//! # tokio_test::block_on(async {
//! let mut routes = Routes::new();
//! routes
//!     .route(
//!         "/hello/{name}",
//!         MethodTable::new().get(handler_fn(|mut job: Job, captures: Captures| async move {
//!             let name = captures.get(0).unwrap_or_default().to_string();
//!             let _ = job.respond_json(200, &serde_json::json!({ "hello": name }));
//!         })),
//!     )
//!     .unwrap();
//!
//! let client = TestClient::new(routes);
//! client
//!     .get("/hello/john")
//!     .send()
//!     .await
//!     .assert_status_code(200)
//!     .assert_json_field("hello", &serde_json::json!("john"));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/chatterbox-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
