//! Node model shared by every backend.
//!
//! Backends (project file trees, tree-sitter language views, microgrammar
//! matches) implement a small set of independent capability traits rather
//! than a class hierarchy. The engine only ever talks to these traits.

pub mod errors;
pub mod format;
pub mod node;
pub mod view;

pub use errors::NodeError;
pub use format::{detect_indent, FormatInfo, PointFormatInfo};
pub use node::{
    ancestors, descendants_or_self, Addressed, AddressedGraphNode, FileArtifact, GraphNode,
    NodeRef, ParentAwareTreeNode, TextTreeNode, TreeNode,
};
pub use view::NodeView;
