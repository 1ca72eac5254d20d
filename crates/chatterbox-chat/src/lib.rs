//! # Chatterbox Chat
//!
//! The chat domain of Chatterbox: messages, users and invites behind a
//! small JSON API.
//!
//! - [`ChatApp`] - Registers the API endpoints (and static front-end routes)
//! - [`ChatStore`] - Storage interface, with [`MemoryStore`] and the
//!   TTL-caching [`CachedStore`]
//! - [`Authenticator`] - HTTP Basic credential checks
//! - [`ApiError`] - Handler errors, mapped once to a status and a
//!   `{"message": ...}` body
//!
//! ## Long-polling
//!
//! `GET .../messages?polling=true` with nothing new to return waits on the
//! state's [`WaitGate`](chatterbox_core::WaitGate) until a `POST` stores a
//! message or the long-poll timeout passes, then queries once more.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use chatterbox_chat::{seed_demo_data, ChatApp, ChatState, MemoryStore};
//! use chatterbox_config::{ChatConfig, InvitesConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! seed_demo_data(store.as_ref())?;
//!
//! let state = ChatState::new(store, &ChatConfig::default(), &InvitesConfig::default());
//! let app = ChatApp::new(Arc::new(state))?;
//! assert_eq!(app.routes().len(), 5);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/chatterbox-chat/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod auth;
mod cache;
mod error;
mod handlers;
mod memory;
mod model;
mod seed;
mod state;
mod store;

pub use app::{api_routes, server_config, ChatApp, MESSAGES_PATH};
pub use auth::{authorize, Authenticator, Credentials, StoreAuthenticator};
pub use cache::{CacheStats, CachedStore};
pub use error::{ApiError, ApiResult, SetupError, StoreError, INTERNAL_ERROR_MESSAGE};
pub use memory::MemoryStore;
pub use model::{now_timestamp, Invite, Message, User};
pub use seed::seed_demo_data;
pub use state::{ChatState, MessageLimits};
pub use store::{ChatStore, MessageQuery, Redemption, StoreResult};
