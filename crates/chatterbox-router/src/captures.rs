//! Captured path segments.
//!
//! Captures are the values of the `{name}` positions of a template, stored
//! in template order. Handlers normally consume them positionally; the
//! template name is kept alongside each value for logging and lookups.

use smallvec::SmallVec;

/// Maximum number of captures stored inline (stack allocated).
const INLINE_CAPTURES: usize = 4;

/// Values captured from a request path, in left-to-right template order.
///
/// # Example
///
/// ```rust
/// use chatterbox_router::Captures;
///
/// let mut captures = Captures::new();
/// captures.push("community", "_");
/// captures.push("channel", "general");
///
/// assert_eq!(captures.get(1), Some("general"));
/// assert_eq!(captures.by_name("community"), Some("_"));
/// assert_eq!(captures.get(2), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Captures {
    inner: SmallVec<[(String, String); INLINE_CAPTURES]>,
}

impl Captures {
    /// Creates an empty capture set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a capture set with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SmallVec::with_capacity(capacity),
        }
    }

    /// Appends a captured value.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value at `index` (0 is the leftmost capture).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.inner.get(index).map(|(_, v)| v.as_str())
    }

    /// Returns the value captured by the template position called `name`.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captured values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over the captured values in order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(|(_, v)| v.as_str())
    }

    /// Iterates over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Consumes the set, returning the values in order.
    #[must_use]
    pub fn into_values(self) -> Vec<String> {
        self.inner.into_iter().map(|(_, v)| v).collect()
    }
}

impl FromIterator<(String, String)> for Captures {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_new() {
        let captures = Captures::new();
        assert!(captures.is_empty());
        assert_eq!(captures.len(), 0);
    }

    #[test]
    fn test_captures_positional_order() {
        let mut captures = Captures::new();
        captures.push("a", "first");
        captures.push("b", "second");

        assert_eq!(captures.get(0), Some("first"));
        assert_eq!(captures.get(1), Some("second"));
        assert_eq!(
            captures.values().collect::<Vec<_>>(),
            vec!["first", "second"]
        );
    }

    #[test]
    fn test_captures_by_name() {
        let mut captures = Captures::new();
        captures.push("community", "rust");
        assert_eq!(captures.by_name("community"), Some("rust"));
        assert_eq!(captures.by_name("channel"), None);
    }

    #[test]
    fn test_captures_into_values() {
        let captures: Captures = vec![
            ("x".to_string(), "1".to_string()),
            ("y".to_string(), "2".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(captures.into_values(), vec!["1", "2"]);
    }

    #[test]
    fn test_captures_spill_past_inline() {
        let mut captures = Captures::with_capacity(2);
        for i in 0..10 {
            captures.push(format!("k{i}"), format!("v{i}"));
        }
        assert_eq!(captures.len(), 10);
        assert_eq!(captures.get(7), Some("v7"));
    }
}
