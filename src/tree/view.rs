use crate::tree::node::{FileArtifact, NodeRef, ParentAwareTreeNode, TextTreeNode};
use std::rc::Rc;

/// A typed view of a node, used to give path expressions and matches a
/// checked element type (`PathExpression<NodeRef, Rc<dyn TextTreeNode>>`).
pub trait NodeView: Clone + Sized {
    /// Capability name reported in cast errors.
    const TYPE_NAME: &'static str;

    /// Probe `node` for this capability.
    fn from_node(node: NodeRef) -> Option<Self>;

    /// The untyped node behind the view.
    fn to_node(&self) -> NodeRef;
}

impl NodeView for NodeRef {
    const TYPE_NAME: &'static str = "TreeNode";

    fn from_node(node: NodeRef) -> Option<Self> {
        Some(node)
    }

    fn to_node(&self) -> NodeRef {
        self.clone()
    }
}

impl NodeView for Rc<dyn ParentAwareTreeNode> {
    const TYPE_NAME: &'static str = "ParentAwareTreeNode";

    fn from_node(node: NodeRef) -> Option<Self> {
        node.into_parent_aware()
    }

    fn to_node(&self) -> NodeRef {
        self.clone()
    }
}

impl NodeView for Rc<dyn TextTreeNode> {
    const TYPE_NAME: &'static str = "TextTreeNode";

    fn from_node(node: NodeRef) -> Option<Self> {
        node.into_text()
    }

    fn to_node(&self) -> NodeRef {
        self.clone()
    }
}

impl NodeView for Rc<dyn FileArtifact> {
    const TYPE_NAME: &'static str = "FileArtifact";

    fn from_node(node: NodeRef) -> Option<Self> {
        node.into_file()
    }

    fn to_node(&self) -> NodeRef {
        self.clone()
    }
}
