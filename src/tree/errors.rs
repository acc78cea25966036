use crate::edit::EditError;
use crate::ts::TreeSitterError;
use thiserror::Error;

/// Backend-defined node failures. The engine propagates these untouched.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("node at {address} no longer exists; re-query after mutation")]
    Stale { address: String },

    #[error("node at {address} is read-only")]
    ReadOnly { address: String },

    #[error("edit failed at {address}: {source}")]
    Edit {
        address: String,
        #[source]
        source: EditError,
    },

    #[error("tree-sitter error: {0}")]
    TreeSitter(#[from] TreeSitterError),

    #[error("{message}")]
    Backend { message: String },
}
