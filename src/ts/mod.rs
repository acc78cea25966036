//! Tree-sitter language views over project files.
//!
//! A view projects a file's concrete syntax tree into the node model. The
//! projection is rebuilt lazily after any change to the file's document and
//! nodes find their place in it again by address.

pub mod errors;
pub mod language;
pub mod node;
pub mod parser;
pub mod projection;
pub mod provider;

pub use errors::TreeSitterError;
pub use language::Language;
pub use node::{view_root, AstNode, SourceView};
pub use parser::{count_error_nodes, LanguageParser};
pub use projection::{Entry, Projection};
pub use provider::LanguageType;
