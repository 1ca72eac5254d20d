//! Endpoint table construction.
//!
//! [`Routes`] collects endpoints in registration order before they are
//! frozen into a [`Dispatcher`](crate::Dispatcher). Registration order is
//! match order, so specific templates go before broader ones.

use std::fmt;

use chatterbox_router::{MethodTable, Router};

use crate::error::ServerError;
use crate::handler::Handler;
use crate::static_files::StaticAsset;

/// Ordered endpoint table under construction.
///
/// # Example
///
/// ```rust
/// use chatterbox_router::MethodTable;
/// use chatterbox_server::{handler_fn, Routes};
///
/// let mut routes = Routes::new();
/// routes
///     .route(
///         "/api/v1/me",
///         MethodTable::new().get(handler_fn(|mut job, _| async move {
///             let _ = job.done();
///         })),
///     )
///     .unwrap();
/// assert_eq!(routes.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Routes {
    router: Router<Handler>,
}

impl Routes {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Route`] if the template is malformed.
    pub fn route(
        &mut self,
        template: &str,
        methods: MethodTable<Handler>,
    ) -> Result<&mut Self, ServerError> {
        self.router.insert(template, methods)?;
        Ok(self)
    }

    /// Appends a `GET` endpoint serving a fixed asset.
    ///
    /// `HEAD` and `OPTIONS` are synthesized like for any other endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Route`] if `path` is not a valid template.
    pub fn asset(&mut self, path: &str, asset: StaticAsset) -> Result<&mut Self, ServerError> {
        self.route(path, MethodTable::new().get(asset.into_handler()))
    }

    /// Appends every `(path, asset)` pair in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`ServerError::Route`] encountered.
    pub fn assets(
        &mut self,
        assets: impl IntoIterator<Item = (String, StaticAsset)>,
    ) -> Result<&mut Self, ServerError> {
        for (path, asset) in assets {
            self.asset(&path, asset)?;
        }
        Ok(self)
    }

    /// Returns the underlying router.
    #[must_use]
    pub fn router(&self) -> &Router<Handler> {
        &self.router
    }

    /// Consumes the table, returning the router.
    #[must_use]
    pub fn into_router(self) -> Router<Handler> {
        self.router
    }

    /// Returns the number of endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.router.len()
    }

    /// Returns true if no endpoints are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.router.is_empty()
    }
}

impl fmt::Debug for Routes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.router.iter().map(|e| e.template().as_str()))
            .finish()
    }
}
