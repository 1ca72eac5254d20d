//! Per-endpoint HTTP method table.
//!
//! [`MethodTable`] maps a fixed set of HTTP methods to optional handlers for
//! a single path template. `HEAD` and `OPTIONS` do not need explicit handlers:
//! [`MethodTable::outcome`] synthesizes them.

use http::Method;

/// Methods in the order they are listed in an `Allow` header.
const LISTING_ORDER: [Method; 7] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// What to do with a request once its endpoint is known.
#[derive(Debug, PartialEq, Eq)]
pub enum MethodOutcome<'a, H> {
    /// An explicit handler exists for the request method.
    Handler(&'a H),
    /// `HEAD` request answered by the `GET` handler with the body discarded.
    HeadViaGet(&'a H),
    /// `OPTIONS` request answered with `204` and the `Allow` header.
    Options,
    /// Any other method: `405` with the `Allow` header.
    NotAllowed,
}

/// Maps HTTP methods to handlers for one endpoint.
///
/// # Example
///
/// ```rust
/// use chatterbox_router::{MethodOutcome, MethodTable};
/// use http::Method;
///
/// let table = MethodTable::new().get("list").post("create");
///
/// assert_eq!(table.outcome(&Method::GET), MethodOutcome::Handler(&"list"));
/// assert_eq!(table.outcome(&Method::HEAD), MethodOutcome::HeadViaGet(&"list"));
/// assert_eq!(table.outcome(&Method::DELETE), MethodOutcome::NotAllowed);
/// assert_eq!(table.allow_header(), "GET, HEAD, POST, OPTIONS");
/// ```
#[derive(Debug, Clone)]
pub struct MethodTable<H> {
    get: Option<H>,
    post: Option<H>,
    put: Option<H>,
    delete: Option<H>,
    patch: Option<H>,
    head: Option<H>,
    options: Option<H>,
}

impl<H> Default for MethodTable<H> {
    fn default() -> Self {
        Self {
            get: None,
            post: None,
            put: None,
            delete: None,
            patch: None,
            head: None,
            options: None,
        }
    }
}

impl<H> MethodTable<H> {
    /// Creates an empty method table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a GET handler.
    #[must_use]
    pub fn get(mut self, handler: H) -> Self {
        self.get = Some(handler);
        self
    }

    /// Registers a POST handler.
    #[must_use]
    pub fn post(mut self, handler: H) -> Self {
        self.post = Some(handler);
        self
    }

    /// Registers a PUT handler.
    #[must_use]
    pub fn put(mut self, handler: H) -> Self {
        self.put = Some(handler);
        self
    }

    /// Registers a DELETE handler.
    #[must_use]
    pub fn delete(mut self, handler: H) -> Self {
        self.delete = Some(handler);
        self
    }

    /// Registers a PATCH handler.
    #[must_use]
    pub fn patch(mut self, handler: H) -> Self {
        self.patch = Some(handler);
        self
    }

    /// Registers an explicit HEAD handler, overriding the GET fallback.
    #[must_use]
    pub fn head(mut self, handler: H) -> Self {
        self.head = Some(handler);
        self
    }

    /// Registers an explicit OPTIONS handler, overriding the synthesized one.
    #[must_use]
    pub fn options(mut self, handler: H) -> Self {
        self.options = Some(handler);
        self
    }

    /// Registers a handler for an arbitrary method.
    ///
    /// Methods outside the table (e.g. `TRACE`, extension methods) are ignored.
    #[must_use]
    pub fn on(mut self, method: &Method, handler: H) -> Self {
        if let Some(slot) = self.slot_mut(method) {
            *slot = Some(handler);
        }
        self
    }

    /// Returns the explicit handler for `method`, if any.
    #[must_use]
    pub fn handler(&self, method: &Method) -> Option<&H> {
        match *method {
            Method::GET => self.get.as_ref(),
            Method::POST => self.post.as_ref(),
            Method::PUT => self.put.as_ref(),
            Method::DELETE => self.delete.as_ref(),
            Method::PATCH => self.patch.as_ref(),
            Method::HEAD => self.head.as_ref(),
            Method::OPTIONS => self.options.as_ref(),
            _ => None,
        }
    }

    fn slot_mut(&mut self, method: &Method) -> Option<&mut Option<H>> {
        match *method {
            Method::GET => Some(&mut self.get),
            Method::POST => Some(&mut self.post),
            Method::PUT => Some(&mut self.put),
            Method::DELETE => Some(&mut self.delete),
            Method::PATCH => Some(&mut self.patch),
            Method::HEAD => Some(&mut self.head),
            Method::OPTIONS => Some(&mut self.options),
            _ => None,
        }
    }

    /// Resolves how a request with `method` is served.
    #[must_use]
    pub fn outcome(&self, method: &Method) -> MethodOutcome<'_, H> {
        if let Some(handler) = self.handler(method) {
            return MethodOutcome::Handler(handler);
        }
        match *method {
            Method::HEAD => self
                .get
                .as_ref()
                .map_or(MethodOutcome::NotAllowed, MethodOutcome::HeadViaGet),
            Method::OPTIONS => MethodOutcome::Options,
            _ => MethodOutcome::NotAllowed,
        }
    }

    /// Returns true if any handler is registered.
    #[must_use]
    pub fn has_any_method(&self) -> bool {
        LISTING_ORDER.iter().any(|m| self.handler(m).is_some())
    }

    /// Returns the methods this endpoint answers.
    ///
    /// Declared methods, plus `HEAD` when `GET` is declared, plus `OPTIONS`
    /// which is always answered.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        LISTING_ORDER
            .iter()
            .filter(|m| match **m {
                Method::HEAD => self.head.is_some() || self.get.is_some(),
                Method::OPTIONS => true,
                _ => self.handler(m).is_some(),
            })
            .cloned()
            .collect()
    }

    /// Formats [`allowed_methods`](Self::allowed_methods) as an `Allow` value.
    #[must_use]
    pub fn allow_header(&self) -> String {
        self.allowed_methods()
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Merges another table into this one without overwriting set slots.
    pub fn merge(&mut self, other: MethodTable<H>) {
        fn fill<H>(slot: &mut Option<H>, other: Option<H>) {
            if slot.is_none() {
                *slot = other;
            }
        }
        fill(&mut self.get, other.get);
        fill(&mut self.post, other.post);
        fill(&mut self.put, other.put);
        fill(&mut self.delete, other.delete);
        fill(&mut self.patch, other.patch);
        fill(&mut self.head, other.head);
        fill(&mut self.options, other.options);
    }

    /// Maps every registered handler through `f`.
    pub fn map<T>(self, mut f: impl FnMut(H) -> T) -> MethodTable<T> {
        MethodTable {
            get: self.get.map(&mut f),
            post: self.post.map(&mut f),
            put: self.put.map(&mut f),
            delete: self.delete.map(&mut f),
            patch: self.patch.map(&mut f),
            head: self.head.map(&mut f),
            options: self.options.map(&mut f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_table_new() {
        let table: MethodTable<&str> = MethodTable::new();
        assert!(!table.has_any_method());
    }

    #[test]
    fn test_method_table_explicit_handlers() {
        let table = MethodTable::new()
            .get("get")
            .post("post")
            .put("put")
            .delete("delete")
            .patch("patch");

        assert_eq!(table.handler(&Method::GET), Some(&"get"));
        assert_eq!(table.handler(&Method::POST), Some(&"post"));
        assert_eq!(table.handler(&Method::PUT), Some(&"put"));
        assert_eq!(table.handler(&Method::DELETE), Some(&"delete"));
        assert_eq!(table.handler(&Method::PATCH), Some(&"patch"));
        assert_eq!(table.handler(&Method::HEAD), None);
    }

    #[test]
    fn test_method_table_on_ignores_unknown_methods() {
        let table = MethodTable::new()
            .on(&Method::POST, "post")
            .on(&Method::TRACE, "trace");
        assert_eq!(table.handler(&Method::POST), Some(&"post"));
        assert_eq!(table.handler(&Method::TRACE), None);
    }

    #[test]
    fn test_outcome_head_falls_back_to_get() {
        let table = MethodTable::new().get("list");
        assert_eq!(table.outcome(&Method::HEAD), MethodOutcome::HeadViaGet(&"list"));
    }

    #[test]
    fn test_outcome_head_without_get_is_not_allowed() {
        let table = MethodTable::new().post("create");
        assert_eq!(table.outcome(&Method::HEAD), MethodOutcome::NotAllowed);
    }

    #[test]
    fn test_outcome_explicit_head_wins() {
        let table = MethodTable::new().get("list").head("peek");
        assert_eq!(table.outcome(&Method::HEAD), MethodOutcome::Handler(&"peek"));
    }

    #[test]
    fn test_outcome_options_synthesized() {
        let table = MethodTable::new().post("create");
        assert_eq!(table.outcome(&Method::OPTIONS), MethodOutcome::Options);

        let table = MethodTable::new().options("custom");
        assert_eq!(
            table.outcome(&Method::OPTIONS),
            MethodOutcome::Handler(&"custom")
        );
    }

    #[test]
    fn test_outcome_unknown_method_not_allowed() {
        let table = MethodTable::new().get("list");
        assert_eq!(table.outcome(&Method::TRACE), MethodOutcome::NotAllowed);
        assert_eq!(table.outcome(&Method::DELETE), MethodOutcome::NotAllowed);
    }

    #[test]
    fn test_allowed_methods_with_get() {
        let table = MethodTable::new().post("create").get("list");
        assert_eq!(
            table.allowed_methods(),
            vec![Method::GET, Method::HEAD, Method::POST, Method::OPTIONS]
        );
    }

    #[test]
    fn test_allowed_methods_without_get() {
        let table = MethodTable::new().post("create").delete("drop");
        assert_eq!(table.allow_header(), "POST, DELETE, OPTIONS");
    }

    #[test]
    fn test_merge_does_not_overwrite() {
        let mut table = MethodTable::new().get("original");
        table.merge(MethodTable::new().get("replacement").post("create"));

        assert_eq!(table.handler(&Method::GET), Some(&"original"));
        assert_eq!(table.handler(&Method::POST), Some(&"create"));
    }

    #[test]
    fn test_map_preserves_slots() {
        let table = MethodTable::new().get(1).post(2).map(|n| n * 10);
        assert_eq!(table.handler(&Method::GET), Some(&10));
        assert_eq!(table.handler(&Method::POST), Some(&20));
        assert_eq!(table.handler(&Method::PUT), None);
    }
}
