use crate::document::Document;
use crate::edit::TextEdit;
use crate::invalidation::Cached;
use crate::tree::{
    Addressed, FileArtifact, FormatInfo, GraphNode, NodeError, NodeRef, ParentAwareTreeNode,
    TextTreeNode, TreeNode,
};
use crate::ts::errors::TreeSitterError;
use crate::ts::language::Language;
use crate::ts::projection::{Entry, Projection};
use std::any::Any;
use std::cell::RefCell;
use std::ops::Range;
use std::rc::{Rc, Weak};
use tracing::debug;

/// Per-document language view state, kept as a document attachment.
pub struct SourceView {
    language: Language,
    root_address: String,
    projection: Cached<Rc<Projection>>,
}

impl SourceView {
    fn new(language: Language, root_address: String) -> Self {
        Self {
            language,
            root_address,
            projection: Cached::new(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Projection for the document's current generation, reparsing if stale.
    pub fn projection(&self, document: &Document) -> Result<Rc<Projection>, TreeSitterError> {
        self.projection
            .try_get_or_build(document.generation(), || {
                document
                    .with_content(|text| {
                        Projection::build(self.language, document.path(), &self.root_address, text)
                    })
                    .map(Rc::new)
            })
    }
}

/// Root node of `file`'s view in `language`.
pub fn view_root(file: Rc<dyn FileArtifact>, language: Language) -> Result<Rc<AstNode>, NodeError> {
    let document = file.document();
    let owner: NodeRef = file;
    let root_address = format!("{}/{}()", owner.address(), language.view_type_name());
    let view = document.attachment(&format!("view:{language}"), || {
        SourceView::new(language, root_address.clone())
    });
    let projection = view.projection(&document)?;
    Ok(AstNode::from_entry(document, view, owner, &projection, 0))
}

#[derive(Debug, Clone)]
struct Snapshot {
    entry: Entry,
    parent_address: Option<String>,
    text: String,
}

/// A node of a language view. Identified by address; every access
/// re-resolves the address against the current projection.
pub struct AstNode {
    document: Rc<Document>,
    view: Rc<SourceView>,
    owner: NodeRef,
    address: String,
    snapshot: RefCell<Snapshot>,
    /// Span written by the last `update`, valid for the generation it produced
    pinned: RefCell<Option<(u64, Range<usize>)>>,
    format: Cached<Option<FormatInfo>>,
    me: Weak<AstNode>,
}

impl AstNode {
    pub(crate) fn from_entry(
        document: Rc<Document>,
        view: Rc<SourceView>,
        owner: NodeRef,
        projection: &Projection,
        index: usize,
    ) -> Rc<Self> {
        let snapshot = snapshot_of(&document, projection, index);
        Rc::new_cyclic(|me| Self {
            address: snapshot.entry.address.clone(),
            document,
            view,
            owner,
            snapshot: RefCell::new(snapshot),
            pinned: RefCell::new(None),
            format: Cached::new(),
            me: me.clone(),
        })
    }

    fn node_at(&self, projection: &Projection, index: usize) -> NodeRef {
        AstNode::from_entry(
            self.document.clone(),
            self.view.clone(),
            self.owner.clone(),
            projection,
            index,
        )
    }

    pub fn language(&self) -> Language {
        self.view.language()
    }

    pub fn document(&self) -> &Rc<Document> {
        &self.document
    }

    /// File node the view belongs to.
    pub fn owner(&self) -> &NodeRef {
        &self.owner
    }

    pub(crate) fn view(&self) -> &Rc<SourceView> {
        &self.view
    }

    pub(crate) fn shared(&self) -> Option<Rc<AstNode>> {
        self.me.upgrade()
    }

    pub fn kind(&self) -> String {
        self.with_entry(|entry| entry.kind.clone())
    }

    fn is_view_root(&self) -> bool {
        self.snapshot.borrow().entry.parent.is_none()
    }

    /// Current projection and this node's entry index, if the address still exists.
    fn resolve(&self) -> Option<(Rc<Projection>, usize)> {
        let projection = match self.view.projection(&self.document) {
            Ok(projection) => projection,
            Err(e) => {
                debug!(address = %self.address, error = %e, "view rebuild failed");
                return None;
            }
        };
        let index = projection.index_of(&self.address)?;
        Some((projection, index))
    }

    fn with_entry<T>(&self, f: impl FnOnce(&Entry) -> T) -> T {
        match self.resolve() {
            Some((projection, index)) => f(&projection.entries()[index]),
            None => f(&self.snapshot.borrow().entry),
        }
    }

    fn pinned_span(&self) -> Option<Range<usize>> {
        match self.pinned.borrow().as_ref() {
            Some((generation, span)) if *generation == self.document.generation() => {
                Some(span.clone())
            }
            _ => None,
        }
    }

    /// Current span in the document: pinned, else resolved by address.
    pub fn span(&self) -> Option<Range<usize>> {
        if let Some(span) = self.pinned_span() {
            return Some(span);
        }
        let (projection, index) = self.resolve()?;
        Some(projection.entries()[index].span.clone())
    }
}

fn snapshot_of(document: &Document, projection: &Projection, index: usize) -> Snapshot {
    let entries = projection.entries();
    let entry = entries[index].clone();
    let parent_address = entry.parent.map(|p| entries[p].address.clone());
    let text = document.slice(entry.span.clone()).unwrap_or_default();
    Snapshot {
        entry,
        parent_address,
        text,
    }
}

impl GraphNode for AstNode {
    fn node_name(&self) -> String {
        self.with_entry(|entry| entry.name.clone())
    }

    fn node_tags(&self) -> Vec<String> {
        self.with_entry(|entry| entry.tags.clone())
    }
}

impl Addressed for AstNode {
    fn address(&self) -> String {
        self.address.clone()
    }
}

impl TreeNode for AstNode {
    fn children(&self) -> Vec<NodeRef> {
        let Some((projection, index)) = self.resolve() else {
            return Vec::new();
        };
        projection.entries()[index]
            .children
            .iter()
            .map(|&child| self.node_at(&projection, child))
            .collect()
    }

    fn property(&self, key: &str) -> Option<String> {
        match key {
            "name" => Some(self.node_name()),
            "kind" => Some(self.kind()),
            _ => self.with_entry(|entry| entry.properties.get(key).cloned()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_parent_aware(&self) -> Option<&dyn ParentAwareTreeNode> {
        Some(self)
    }

    fn as_text(&self) -> Option<&dyn TextTreeNode> {
        Some(self)
    }

    fn into_parent_aware(self: Rc<Self>) -> Option<Rc<dyn ParentAwareTreeNode>> {
        Some(self)
    }

    fn into_text(self: Rc<Self>) -> Option<Rc<dyn TextTreeNode>> {
        Some(self)
    }
}

impl ParentAwareTreeNode for AstNode {
    fn parent(&self) -> Option<NodeRef> {
        if self.is_view_root() {
            return Some(self.owner.clone());
        }
        if let Some((projection, index)) = self.resolve() {
            if let Some(parent) = projection.entries()[index].parent {
                return Some(self.node_at(&projection, parent));
            }
        }
        // Stale handle: rebuild the parent from the address we last saw
        let parent_address = self.snapshot.borrow().parent_address.clone()?;
        let resolved = self.view.projection(&self.document).ok().and_then(|projection| {
            let index = projection.index_of(&parent_address)?;
            Some((projection, index))
        });
        match resolved {
            Some((projection, index)) => Some(self.node_at(&projection, index)),
            None => Some(self.owner.clone()),
        }
    }
}

impl TextTreeNode for AstNode {
    fn value(&self) -> String {
        if let Some(text) = self.pinned_span().and_then(|span| self.document.slice(span)) {
            return text;
        }
        match self.resolve() {
            Some((projection, index)) => {
                let snapshot = snapshot_of(&self.document, &projection, index);
                let text = snapshot.text.clone();
                *self.snapshot.borrow_mut() = snapshot;
                text
            }
            None => self.snapshot.borrow().text.clone(),
        }
    }

    fn update(&self, new_value: &str) -> Result<(), NodeError> {
        let span = self.span().ok_or_else(|| NodeError::Stale {
            address: self.address(),
        })?;

        let edit = self
            .document
            .with_content(|text| TextEdit::replacing(text, span.clone(), new_value));
        self.document
            .apply(&edit)
            .map_err(|source| NodeError::Edit {
                address: self.address(),
                source,
            })?;

        *self.pinned.borrow_mut() = Some((
            self.document.generation(),
            span.start..span.start + new_value.len(),
        ));
        self.snapshot.borrow_mut().text = new_value.to_string();
        debug!(
            address = %self.address,
            generation = self.document.generation(),
            "updated view node"
        );
        Ok(())
    }

    fn format_info(&self) -> Option<FormatInfo> {
        self.format.get_or_build(self.document.generation(), || {
            let span = self
                .span()
                .unwrap_or_else(|| self.snapshot.borrow().entry.span.clone());
            self.document
                .with_content(|text| Some(FormatInfo::for_span(text, span)))
        })
    }
}
