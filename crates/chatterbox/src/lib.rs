//! # Chatterbox
//!
//! A small chat backend: messages, users and invites over a JSON HTTP API,
//! with long-polling for new messages.
//!
//! The workspace is split into:
//!
//! - [`core`] - `Job` request/response handle and the `WaitGate`
//! - [`router`] - Ordered path templates with captures
//! - [`server`] - Dispatcher, static files and the HTTP/1.1 server
//! - [`config`] - Layered configuration
//! - [`telemetry`] - Logging and Prometheus metrics
//! - [`chat`] - The chat API itself
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatterbox::chat::ChatApp;
//! use chatterbox::config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().with_defaults().load()?;
//!     ChatApp::from_config(&config)?.into_server(&config).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/chatterbox/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use chatterbox_core as core;

// Re-export router types
pub use chatterbox_router as router;

// Re-export server types
pub use chatterbox_server as server;

// Re-export configuration
pub use chatterbox_config as config;

// Re-export telemetry
pub use chatterbox_telemetry as telemetry;

// Re-export the chat application
pub use chatterbox_chat as chat;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports.
pub mod prelude {
    pub use chatterbox_chat::{ChatApp, ChatState, ChatStore, MemoryStore};
    pub use chatterbox_config::{ChatterboxConfig, ConfigLoader};
    pub use chatterbox_core::{Job, JobError, WaitGate};
    pub use chatterbox_server::{handler_fn, Routes, Server};
}
