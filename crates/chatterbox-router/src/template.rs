//! Path templates.
//!
//! A template is a `/`-separated list of segments. A segment written as
//! `{name}` captures whatever single request segment sits at that position;
//! every other segment must match literally.

use std::fmt;

use crate::captures::Captures;
use crate::error::TemplateError;

/// One position of a [`Template`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the request segment exactly.
    Literal(String),
    /// Matches any single segment; the value is captured under this name.
    Capture(String),
}

/// A parsed path template with a fixed segment count.
///
/// The leading `/` is stripped, so `/` has zero segments and a trailing
/// slash contributes one empty literal segment, mirroring how request
/// paths are split.
///
/// # Example
///
/// ```rust
/// use chatterbox_router::Template;
///
/// let template = Template::parse("/api/v1/users/{name}").unwrap();
/// assert_eq!(template.len(), 4);
///
/// let path = ["api", "v1", "users", "john"];
/// let captures = template.matches(&path).unwrap();
/// assert_eq!(captures.get(0), Some("john"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    raw: String,
    segments: Vec<Segment>,
    capture_count: usize,
}

impl Template {
    /// Parses a template string.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the template does not start with `/`,
    /// contains an unnamed capture (`{}`), or a segment with stray braces.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let rest = template
            .strip_prefix('/')
            .ok_or_else(|| TemplateError::MissingLeadingSlash(template.to_string()))?;

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for part in rest.split('/') {
                segments.push(Self::parse_segment(template, part)?);
            }
        }

        let capture_count = segments
            .iter()
            .filter(|s| matches!(s, Segment::Capture(_)))
            .count();

        Ok(Self {
            raw: template.to_string(),
            segments,
            capture_count,
        })
    }

    fn parse_segment(template: &str, part: &str) -> Result<Segment, TemplateError> {
        if let Some(name) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
            if name.is_empty() {
                return Err(TemplateError::UnnamedCapture(template.to_string()));
            }
            if name.contains(['{', '}']) {
                return Err(TemplateError::InvalidSegment {
                    template: template.to_string(),
                    segment: part.to_string(),
                });
            }
            return Ok(Segment::Capture(name.to_string()));
        }
        if part.contains(['{', '}']) {
            return Err(TemplateError::InvalidSegment {
                template: template.to_string(),
                segment: part.to_string(),
            });
        }
        Ok(Segment::Literal(part.to_string()))
    }

    /// Returns the template string as registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true for the root template `/`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of capture positions.
    #[must_use]
    pub fn capture_count(&self) -> usize {
        self.capture_count
    }

    /// Matches already-split request segments against this template.
    ///
    /// Returns the captured values left to right, or `None` when the
    /// segment count differs or a literal does not match.
    #[must_use]
    pub fn matches<S: AsRef<str>>(&self, path: &[S]) -> Option<Captures> {
        if path.len() != self.segments.len() {
            return None;
        }

        let mut captures = Captures::with_capacity(self.capture_count);
        for (segment, actual) in self.segments.iter().zip(path) {
            match segment {
                Segment::Literal(expected) => {
                    if expected != actual.as_ref() {
                        return None;
                    }
                }
                Segment::Capture(name) => captures.push(name.as_str(), actual.as_ref()),
            }
        }
        Some(captures)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
