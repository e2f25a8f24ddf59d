use thiserror::Error;

use crate::span::Span;

/// A problem found while analysing or compiling a file. Passes collect
/// these instead of stopping at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{span}: {message}")]
pub struct SemanticIssue {
    pub message: String,
    pub span: Span,
}

impl SemanticIssue {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}
