use crate::document::Document;
use crate::tree::errors::NodeError;
use crate::tree::format::FormatInfo;
use std::any::Any;
use std::rc::Rc;

/// Shared handle to any node participating in queries.
pub type NodeRef = Rc<dyn TreeNode>;

/// Anything that can be matched by name or tag.
pub trait GraphNode {
    /// Display name; what bare name steps (`/src/main`) compare against.
    fn node_name(&self) -> String;

    /// Type labels used for tag-based matching (`File()`, `YamlString()`).
    fn node_tags(&self) -> Vec<String>;

    fn has_tag(&self, tag: &str) -> bool {
        self.node_tags().iter().any(|t| t == tag)
    }
}

pub trait Addressed {
    /// Path from the root of the tree. Stable across rebuilds of the same
    /// structural position, so it is the identity key across queries.
    fn address(&self) -> String;
}

pub trait AddressedGraphNode: GraphNode + Addressed {}

impl<T: GraphNode + Addressed + ?Sized> AddressedGraphNode for T {}

/// Operations common to all tree nodes.
///
/// The `as_*`/`into_*` methods are capability probes. Backends override the
/// ones they support; the defaults report the capability as absent.
pub trait TreeNode: AddressedGraphNode {
    /// Children in document order. Computed on each call; never hold on to
    /// the result across a mutation.
    fn children(&self) -> Vec<NodeRef>;

    /// String-valued attribute for `[@key='value']` predicates.
    fn property(&self, key: &str) -> Option<String> {
        (key == "name").then(|| self.node_name())
    }

    fn as_any(&self) -> &dyn Any;

    fn as_parent_aware(&self) -> Option<&dyn ParentAwareTreeNode> {
        None
    }

    fn as_text(&self) -> Option<&dyn TextTreeNode> {
        None
    }

    fn as_file(&self) -> Option<&dyn FileArtifact> {
        None
    }

    fn into_parent_aware(self: Rc<Self>) -> Option<Rc<dyn ParentAwareTreeNode>> {
        None
    }

    fn into_text(self: Rc<Self>) -> Option<Rc<dyn TextTreeNode>> {
        None
    }

    fn into_file(self: Rc<Self>) -> Option<Rc<dyn FileArtifact>> {
        None
    }
}

/// Tree nodes that understand their place in the hierarchy.
pub trait ParentAwareTreeNode: TreeNode {
    /// Parent node. Always `Some` for AST-backed nodes; `None` at a project root.
    fn parent(&self) -> Option<NodeRef>;
}

/// Additional operations on text based tree nodes.
pub trait TextTreeNode: ParentAwareTreeNode {
    /// String value of this node. Containers cover the text of all descendants.
    fn value(&self) -> String;

    /// Replace the node's text. Afterwards `value()` returns `new_value` and
    /// every child handle obtained before the call is no longer authoritative.
    fn update(&self, new_value: &str) -> Result<(), NodeError>;

    /// Position of the node in its file as of the latest (re)build, if known.
    fn format_info(&self) -> Option<FormatInfo>;
}

/// A whole file in a project tree.
pub trait FileArtifact: TextTreeNode {
    /// Project-relative path using `/` separators.
    fn path(&self) -> String;

    /// Buffer backing this file, shared by every view over it.
    fn document(&self) -> Rc<Document>;

    fn content(&self) -> String {
        self.value()
    }

    fn set_content(&self, content: &str) -> Result<(), NodeError> {
        self.update(content)
    }

    fn contains(&self, needle: &str) -> bool {
        self.content().contains(needle)
    }

    fn extension(&self) -> Option<String> {
        let path = self.path();
        let name = path.rsplit('/').next().unwrap_or(&path);
        name.rsplit_once('.')
            .filter(|(stem, _)| !stem.is_empty())
            .map(|(_, ext)| ext.to_string())
    }

    /// Replace every occurrence of `old` with `new`. Returns how many were replaced.
    fn replace(&self, old: &str, new: &str) -> Result<usize, NodeError> {
        if old.is_empty() {
            return Ok(0);
        }
        let content = self.content();
        let count = content.matches(old).count();
        if count > 0 {
            self.set_content(&content.replace(old, new))?;
        }
        Ok(count)
    }
}

/// Pre-order closure of `node`, including `node` itself.
pub fn descendants_or_self(node: &NodeRef) -> Vec<NodeRef> {
    let mut out = Vec::new();
    let mut stack = vec![node.clone()];
    while let Some(next) = stack.pop() {
        let children = next.children();
        out.push(next);
        stack.extend(children.into_iter().rev());
    }
    out
}

/// Ancestors of `node`, nearest first.
pub fn ancestors(node: &dyn ParentAwareTreeNode) -> Vec<NodeRef> {
    let mut out = Vec::new();
    let mut current = node.parent();
    while let Some(parent) = current {
        current = parent.as_parent_aware().and_then(|p| p.parent());
        out.push(parent);
    }
    out
}
