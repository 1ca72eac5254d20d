//! Template registration errors.

use thiserror::Error;

/// Errors raised while parsing a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Templates are absolute paths.
    #[error("template must start with '/': {0}")]
    MissingLeadingSlash(String),

    /// A capture position without a name, e.g. `/users/{}`.
    #[error("capture without a name in template: {0}")]
    UnnamedCapture(String),

    /// A segment with unbalanced or embedded braces.
    #[error("invalid segment '{segment}' in template {template}")]
    InvalidSegment {
        /// The full template.
        template: String,
        /// The offending segment.
        segment: String,
    },
}
