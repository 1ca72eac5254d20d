//! Application assembly.
//!
//! [`ChatApp`] registers the API endpoints, and optionally the static
//! front-end routes, in match order:
//!
//! | Template | Methods |
//! |---|---|
//! | `/api/v1/communities/{community}/channels/{channel}/messages` | `GET`, `POST` |
//! | `/api/v1/me` | `GET`, `POST` |
//! | `/api/v1/users/{name}` | `GET` |
//! | `/api/v1/invites` | `GET`, `POST` |
//! | `/api/v1/invites/{code}` | `GET` |
//! | front-end map entries | `GET` |

use std::path::Path;
use std::sync::Arc;

use chatterbox_config::ChatterboxConfig;
use chatterbox_router::MethodTable;
use chatterbox_server::{load_frontend_map, CorsPolicy, Routes, Server, ServerConfig, ServerError};

use crate::cache::CachedStore;
use crate::error::SetupError;
use crate::handlers::{bind, invites, messages, users};
use crate::memory::MemoryStore;
use crate::seed::seed_demo_data;
use crate::state::ChatState;

/// Path of the message endpoint.
pub const MESSAGES_PATH: &str = "/api/v1/communities/{community}/channels/{channel}/messages";

/// The chat API with its endpoint table.
#[derive(Debug)]
pub struct ChatApp {
    state: Arc<ChatState>,
    routes: Routes,
}

impl ChatApp {
    /// Registers the API endpoints over `state`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Server`] if an endpoint cannot be registered.
    pub fn new(state: Arc<ChatState>) -> Result<Self, SetupError> {
        let routes = api_routes(&state)?;
        Ok(Self { state, routes })
    }

    /// Builds the whole application from configuration.
    ///
    /// Creates an in-memory store behind a TTL cache, starts the cache
    /// sweeper, seeds demo data if configured and loads the front-end map.
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if seeding fails or a front-end file cannot be
    /// loaded.
    pub fn from_config(config: &ChatterboxConfig) -> Result<Self, SetupError> {
        let store = Arc::new(CachedStore::new(MemoryStore::new(), config.chat.cache_ttl()));
        store.spawn_sweeper(config.chat.cache_sweep_interval());

        if config.chat.seed_demo_data {
            seed_demo_data(store.as_ref())?;
        }

        let state = Arc::new(ChatState::new(store, &config.chat, &config.invites));
        let mut app = Self::new(state)?;

        if let Some(map_file) = &config.frontend.map_file {
            let assets = load_frontend_map(
                Path::new(map_file),
                Path::new(&config.frontend.assets_dir),
            )
            .map_err(ServerError::from)?;
            app.routes.assets(assets)?;
        }

        tracing::info!(endpoints = app.routes.len(), "chat application ready");
        Ok(app)
    }

    /// Returns the shared state.
    pub fn state(&self) -> &Arc<ChatState> {
        &self.state
    }

    /// Returns the endpoint table.
    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// Consumes the app, returning the endpoint table.
    pub fn into_routes(self) -> Routes {
        self.routes
    }

    /// Creates a server for this app.
    pub fn into_server(self, config: &ChatterboxConfig) -> Server {
        Server::new(server_config(config), self.routes)
    }
}

/// Builds the endpoint table of the chat API.
///
/// # Errors
///
/// Returns [`ServerError::Route`] if a template is malformed.
pub fn api_routes(state: &Arc<ChatState>) -> Result<Routes, ServerError> {
    let mut routes = Routes::new();
    routes
        .route(
            MESSAGES_PATH,
            MethodTable::new()
                .get(bind(state, messages::list))
                .post(bind(state, messages::create)),
        )?
        .route(
            "/api/v1/me",
            MethodTable::new()
                .get(bind(state, users::me))
                .post(bind(state, users::sign_up)),
        )?
        .route(
            "/api/v1/users/{name}",
            MethodTable::new().get(bind(state, users::lookup)),
        )?
        .route(
            "/api/v1/invites",
            MethodTable::new()
                .get(bind(state, invites::list))
                .post(bind(state, invites::create)),
        )?
        .route(
            "/api/v1/invites/{code}",
            MethodTable::new().get(bind(state, invites::check)),
        )?;
    Ok(routes)
}

/// Converts the file configuration into the server's own settings.
pub fn server_config(config: &ChatterboxConfig) -> ServerConfig {
    let cors = CorsPolicy::new(
        config.cors.allow_origins.clone(),
        config.cors.allow_methods.clone(),
        config.cors.allow_headers.clone(),
    );

    ServerConfig::builder()
        .http_addr(config.server.http_addr.clone())
        .shutdown_timeout(config.server.shutdown_timeout())
        .request_deadline(config.server.request_deadline())
        .max_body_bytes(config.server.max_body_bytes)
        .cors(cors)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatterbox_config::{CorsConfig, FrontendConfig};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_server_config_conversion() {
        let mut config = ChatterboxConfig::default();
        config.server.http_addr = "0.0.0.0:3000".into();
        config.server.request_deadline_secs = 120;
        config.cors = CorsConfig {
            allow_origins: vec!["*".into()],
            ..CorsConfig::default()
        };

        let server = server_config(&config);
        assert_eq!(server.http_addr(), "0.0.0.0:3000");
        assert_eq!(server.request_deadline(), Duration::from_secs(120));
        assert!(!server.cors().is_empty());
    }

    #[tokio::test]
    async fn test_from_config_registers_api_in_order() {
        let app = ChatApp::from_config(&ChatterboxConfig::default()).unwrap();
        let templates: Vec<_> = app
            .routes()
            .router()
            .iter()
            .map(|e| e.template().as_str().to_string())
            .collect();
        assert_eq!(
            templates,
            vec![
                MESSAGES_PATH,
                "/api/v1/me",
                "/api/v1/users/{name}",
                "/api/v1/invites",
                "/api/v1/invites/{code}",
            ]
        );
    }

    #[tokio::test]
    async fn test_from_config_seeds_and_loads_frontend() {
        let assets = TempDir::new().unwrap();
        fs::write(assets.path().join("index.html"), "<html></html>").unwrap();
        let map = assets.path().join("frontendmap.json");
        fs::write(&map, r#"{"/": "index.html", "/login": "index.html"}"#).unwrap();

        let mut config = ChatterboxConfig::default();
        config.chat.seed_demo_data = true;
        config.frontend = FrontendConfig {
            map_file: Some(map.to_string_lossy().into_owned()),
            assets_dir: assets.path().to_string_lossy().into_owned(),
        };

        let app = ChatApp::from_config(&config).unwrap();
        assert_eq!(app.routes().len(), 7);
        assert!(app.state().store().user("john").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_from_config_missing_frontend_map() {
        let mut config = ChatterboxConfig::default();
        config.frontend.map_file = Some("/nonexistent/frontendmap.json".into());

        let result = ChatApp::from_config(&config);
        assert!(matches!(result, Err(SetupError::Server(ServerError::Static(_)))));
    }
}
