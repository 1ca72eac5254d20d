//! Ordered endpoint table.
//!
//! This module provides [`Endpoint`] and [`Router`]. Endpoints are matched in
//! registration order and the first one whose template fits the request
//! path wins.

use http::Method;

use crate::captures::Captures;
use crate::error::TemplateError;
use crate::method_table::{MethodOutcome, MethodTable};
use crate::template::Template;

/// A path template paired with its per-method handlers.
///
/// The `Allow` header value is computed once, when the endpoint is built.
#[derive(Debug, Clone)]
pub struct Endpoint<H> {
    template: Template,
    methods: MethodTable<H>,
    allow: String,
}

impl<H> Endpoint<H> {
    /// Creates an endpoint from a parsed template and its method table.
    #[must_use]
    pub fn new(template: Template, methods: MethodTable<H>) -> Self {
        let allow = methods.allow_header();
        Self {
            template,
            methods,
            allow,
        }
    }

    /// Returns the endpoint's template.
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Returns the endpoint's method table.
    #[must_use]
    pub fn methods(&self) -> &MethodTable<H> {
        &self.methods
    }

    /// Returns the precomputed `Allow` header value.
    #[must_use]
    pub fn allow(&self) -> &str {
        &self.allow
    }

    /// Resolves how `method` is served by this endpoint.
    #[must_use]
    pub fn outcome(&self, method: &Method) -> MethodOutcome<'_, H> {
        self.methods.outcome(method)
    }
}

/// A matched endpoint together with the captured path values.
#[derive(Debug)]
pub struct Resolved<'a, H> {
    /// The first endpoint, in registration order, matching the path.
    pub endpoint: &'a Endpoint<H>,
    /// Captured values, left to right.
    pub captures: Captures,
}

impl<'a, H> Resolved<'a, H> {
    /// Resolves the request method against the matched endpoint.
    #[must_use]
    pub fn outcome(&self, method: &Method) -> MethodOutcome<'a, H> {
        self.endpoint.outcome(method)
    }
}

/// An ordered collection of endpoints.
///
/// # Example
///
/// ```rust
/// use chatterbox_router::{MethodOutcome, MethodTable, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router
///     .insert("/api/v1/users/{name}", MethodTable::new().get("getUser"))
///     .unwrap();
///
/// let path = vec!["api".to_string(), "v1".into(), "users".into(), "john".into()];
/// let resolved = router.resolve(&path).unwrap();
/// assert_eq!(resolved.captures.get(0), Some("john"));
/// assert_eq!(resolved.outcome(&Method::GET), MethodOutcome::Handler(&"getUser"));
/// ```
///
/// # Matching rules
///
/// 1. Endpoints with a different segment count are skipped.
/// 2. Every literal segment must equal the request segment at its index;
///    capture segments always match.
/// 3. The first endpoint satisfying both wins, so a more specific endpoint
///    must be registered before a broader one it overlaps with.
#[derive(Debug, Clone)]
pub struct Router<H> {
    endpoints: Vec<Endpoint<H>>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Router<H> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoints: Vec::new(),
        }
    }

    /// Parses `template` and appends an endpoint for it.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the template is malformed.
    pub fn insert(
        &mut self,
        template: &str,
        methods: MethodTable<H>,
    ) -> Result<&mut Self, TemplateError> {
        let template = Template::parse(template)?;
        self.push(Endpoint::new(template, methods));
        Ok(self)
    }

    /// Appends an already-built endpoint.
    pub fn push(&mut self, endpoint: Endpoint<H>) {
        self.endpoints.push(endpoint);
    }

    /// Finds the first endpoint matching the split request path.
    #[must_use]
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Option<Resolved<'_, H>> {
        self.endpoints.iter().find_map(|endpoint| {
            endpoint
                .template
                .matches(path)
                .map(|captures| Resolved { endpoint, captures })
        })
    }

    /// Resolves both the endpoint and the method outcome in one call.
    #[must_use]
    pub fn match_route<S: AsRef<str>>(
        &self,
        method: &Method,
        path: &[S],
    ) -> Option<(MethodOutcome<'_, H>, Captures)> {
        let resolved = self.resolve(path)?;
        Some((resolved.endpoint.outcome(method), resolved.captures))
    }

    /// Iterates over endpoints in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Endpoint<H>> {
        self.endpoints.iter()
    }

    /// Returns the number of endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns true if no endpoints are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(path: &str) -> Vec<String> {
        if path == "/" {
            return Vec::new();
        }
        path.split('/').skip(1).map(String::from).collect()
    }

    #[test]
    fn test_router_new() {
        let router: Router<&str> = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_router_insert_rejects_bad_template() {
        let mut router = Router::new();
        assert!(router.insert("users", MethodTable::new().get("x")).is_err());
        assert!(router.is_empty());
    }

    #[test]
    fn test_router_match_literal() {
        let mut router = Router::new();
        router
            .insert("/api/v1/me", MethodTable::new().get("me"))
            .unwrap();

        let resolved = router.resolve(&split("/api/v1/me")).unwrap();
        assert!(resolved.captures.is_empty());
        assert_eq!(resolved.outcome(&Method::GET), MethodOutcome::Handler(&"me"));
    }

    #[test]
    fn test_router_match_captures() {
        let mut router = Router::new();
        router
            .insert(
                "/api/v1/communities/{community}/channels/{channel}/messages",
                MethodTable::new().get("list").post("create"),
            )
            .unwrap();

        let (outcome, captures) = router
            .match_route(
                &Method::POST,
                &split("/api/v1/communities/_/channels/_/messages"),
            )
            .unwrap();
        assert_eq!(outcome, MethodOutcome::Handler(&"create"));
        assert_eq!(captures.values().collect::<Vec<_>>(), vec!["_", "_"]);
    }

    #[test]
    fn test_router_first_registered_wins() {
        let mut router = Router::new();
        router
            .insert("/api/v1/invites/{code}", MethodTable::new().get("byCode"))
            .unwrap()
            .insert("/api/v1/invites/mine", MethodTable::new().get("mine"))
            .unwrap();

        let (outcome, _) = router
            .match_route(&Method::GET, &split("/api/v1/invites/mine"))
            .unwrap();
        assert_eq!(outcome, MethodOutcome::Handler(&"byCode"));
    }

    #[test]
    fn test_router_no_match() {
        let mut router = Router::new();
        router.insert("/users", MethodTable::new().get("list")).unwrap();

        assert!(router.resolve(&split("/posts")).is_none());
        assert!(router.resolve(&split("/users/1")).is_none());
    }

    #[test]
    fn test_router_trailing_slash_is_distinct() {
        let mut router = Router::new();
        router.insert("/users", MethodTable::new().get("list")).unwrap();

        assert!(router.resolve(&split("/users")).is_some());
        assert!(router.resolve(&split("/users/")).is_none());
    }

    #[test]
    fn test_router_root() {
        let mut router = Router::new();
        router.insert("/", MethodTable::new().get("index")).unwrap();

        let resolved = router.resolve(&split("/")).unwrap();
        assert_eq!(resolved.endpoint.template().as_str(), "/");
    }

    #[test]
    fn test_router_method_not_allowed_keeps_allow() {
        let mut router = Router::new();
        router
            .insert("/api/v1/me", MethodTable::new().get("me").post("signup"))
            .unwrap();

        let resolved = router.resolve(&split("/api/v1/me")).unwrap();
        assert_eq!(resolved.outcome(&Method::DELETE), MethodOutcome::NotAllowed);
        assert_eq!(resolved.endpoint.allow(), "GET, HEAD, POST, OPTIONS");
    }

    #[test]
    fn test_router_iter_in_registration_order() {
        let mut router = Router::new();
        router
            .insert("/b", MethodTable::new().get(2))
            .unwrap()
            .insert("/a", MethodTable::new().get(1))
            .unwrap();

        let templates: Vec<_> = router.iter().map(|e| e.template().as_str()).collect();
        assert_eq!(templates, vec!["/b", "/a"]);
    }
}
