use crate::expr::ParseError;
use crate::tree::NodeError;
use crate::types::MicrogrammarError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unknown type '{name}()'{}", suggestion.as_ref().map(|s| format!("; did you mean '{s}()'?")).unwrap_or_default())]
    UnknownType {
        name: String,
        suggestion: Option<String>,
    },

    #[error("expression '{expression}' matched nothing, expected exactly 1 node")]
    NoMatch { expression: String },

    #[error("expression '{expression}' matched {count} nodes, expected exactly 1")]
    AmbiguousMatch { expression: String, count: usize },

    #[error("node at {address} cannot be viewed as {type_name}")]
    InvalidCast { address: String, type_name: String },

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error(transparent)]
    Microgrammar(#[from] MicrogrammarError),
}
