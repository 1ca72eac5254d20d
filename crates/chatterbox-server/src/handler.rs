//! Type-erased endpoint handlers.
//!
//! A handler receives the [`Job`] for one exchange together with the
//! positional path captures of the endpoint that matched. It owns the job
//! and is expected to write a response head; returning without one makes
//! the dispatcher answer `500`.
//!
//! # Example
//!
//! ```rust
//! use chatterbox_core::Job;
//! use chatterbox_router::Captures;
//! use chatterbox_server::{handler_fn, Handler};
//!
//! async fn hello(mut job: Job, _captures: Captures) {
//!     let _ = job.respond_json(200, &serde_json::json!({"hello": "world"}));
//! }
//!
//! let handler: Handler = handler_fn(hello);
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chatterbox_core::Job;
use chatterbox_router::Captures;

/// Boxed future returned by a [`Handler`].
pub type BoxedHandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A type-erased endpoint handler.
pub type Handler = Arc<dyn Fn(Job, Captures) -> BoxedHandlerFuture + Send + Sync>;

/// Erases an async function into a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Job, Captures) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |job, captures| Box::pin(f(job, captures)))
}
