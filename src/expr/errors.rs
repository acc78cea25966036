use thiserror::Error;

/// Malformed path expression. Raised before any node is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid path expression '{expression}' at position {position}: {message}")]
pub struct ParseError {
    pub expression: String,
    /// Character offset where the problem was detected
    pub position: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(expression: &str, position: usize, message: impl Into<String>) -> Self {
        Self {
            expression: expression.to_string(),
            position,
            message: message.into(),
        }
    }
}
