//! # Chatterbox Server
//!
//! HTTP server and request dispatcher for the Chatterbox chat backend.
//!
//! - [`Server`] - HTTP/1.1 accept loop over hyper with graceful shutdown
//! - [`Dispatcher`] - Turns requests into [`Job`](chatterbox_core::Job)s and
//!   routes them, answering `404`, `405`, `OPTIONS`, `501` and `504` itself
//! - [`Routes`] - The endpoint table handlers are registered in
//! - [`StaticAsset`] - Front-end files served from memory
//!
//! ## Example
//!
//! ```rust,no_run
//! use chatterbox_core::Job;
//! use chatterbox_router::MethodTable;
//! use chatterbox_server::{handler_fn, Routes, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut routes = Routes::new();
//!     routes.route(
//!         "/api/v1/ping",
//!         MethodTable::new().get(handler_fn(|mut job: Job, _| async move {
//!             let _ = job.done();
//!         })),
//!     )?;
//!
//!     let config = ServerConfig::builder().http_addr("127.0.0.1:8080").build();
//!     Server::new(config, routes).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/chatterbox-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod dispatcher;
mod error;
mod handler;
mod routes;
mod server;
mod shutdown;
mod static_files;

pub use config::{CorsPolicy, ServerConfig, ServerConfigBuilder};
pub use dispatcher::Dispatcher;
pub use error::{ServerError, StaticFileError};
pub use handler::{handler_fn, BoxedHandlerFuture, Handler};
pub use routes::Routes;
pub use server::Server;
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
pub use static_files::{detect_mime_type, load_frontend_map, StaticAsset};
