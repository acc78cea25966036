use crate::document::Document;
use crate::tree::{
    Addressed, FileArtifact, FormatInfo, GraphNode, NodeError, NodeRef, ParentAwareTreeNode,
    TextTreeNode, TreeNode,
};
use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

#[derive(Clone)]
pub(crate) enum ProjectEntry {
    Directory(Rc<DirectoryNode>),
    File(Rc<FileNode>),
}

impl ProjectEntry {
    fn node(&self) -> NodeRef {
        match self {
            ProjectEntry::Directory(dir) => dir.clone() as NodeRef,
            ProjectEntry::File(file) => file.clone() as NodeRef,
        }
    }
}

/// A directory, or the project root when it has no parent.
pub struct DirectoryNode {
    name: String,
    /// Project-relative path; empty for the root
    path: String,
    parent: Option<Weak<DirectoryNode>>,
    entries: RefCell<BTreeMap<String, ProjectEntry>>,
    me: Weak<DirectoryNode>,
}

impl DirectoryNode {
    pub(crate) fn root(name: &str) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            name: name.to_string(),
            path: String::new(),
            parent: None,
            entries: RefCell::new(BTreeMap::new()),
            me: me.clone(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    fn child_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{name}", self.path)
        }
    }

    pub(crate) fn entry(&self, name: &str) -> Option<ProjectEntry> {
        self.entries.borrow().get(name).cloned()
    }

    pub(crate) fn entries(&self) -> Vec<ProjectEntry> {
        self.entries.borrow().values().cloned().collect()
    }

    /// Existing subdirectory `name`, created if absent. `None` if a file has that name.
    pub(crate) fn subdirectory(&self, name: &str) -> Option<Rc<DirectoryNode>> {
        match self.entry(name) {
            Some(ProjectEntry::Directory(dir)) => return Some(dir),
            Some(ProjectEntry::File(_)) => return None,
            None => {}
        }
        let dir = Rc::new_cyclic(|me| DirectoryNode {
            name: name.to_string(),
            path: self.child_path(name),
            parent: Some(self.me.clone()),
            entries: RefCell::new(BTreeMap::new()),
            me: me.clone(),
        });
        self.entries
            .borrow_mut()
            .insert(name.to_string(), ProjectEntry::Directory(dir.clone()));
        Some(dir)
    }

    /// New file `name`. `None` if the name is taken.
    pub(crate) fn create_file(&self, name: &str, content: String) -> Option<Rc<FileNode>> {
        if self.entry(name).is_some() {
            return None;
        }
        let path = self.child_path(name);
        let file = Rc::new(FileNode {
            name: name.to_string(),
            document: Document::new(path.clone(), content),
            path,
            parent: self.me.clone(),
        });
        self.entries
            .borrow_mut()
            .insert(name.to_string(), ProjectEntry::File(file.clone()));
        Some(file)
    }
}

impl GraphNode for DirectoryNode {
    fn node_name(&self) -> String {
        self.name.clone()
    }

    fn node_tags(&self) -> Vec<String> {
        if self.is_root() {
            vec!["Project".to_string()]
        } else {
            vec!["Directory".to_string()]
        }
    }
}

impl Addressed for DirectoryNode {
    fn address(&self) -> String {
        format!("/{}", self.path)
    }
}

impl TreeNode for DirectoryNode {
    fn children(&self) -> Vec<NodeRef> {
        self.entries().iter().map(ProjectEntry::node).collect()
    }

    fn property(&self, key: &str) -> Option<String> {
        match key {
            "name" => Some(self.name.clone()),
            "path" => Some(self.path.clone()),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_parent_aware(&self) -> Option<&dyn ParentAwareTreeNode> {
        Some(self)
    }

    fn into_parent_aware(self: Rc<Self>) -> Option<Rc<dyn ParentAwareTreeNode>> {
        Some(self)
    }
}

impl ParentAwareTreeNode for DirectoryNode {
    fn parent(&self) -> Option<NodeRef> {
        let parent = self.parent.as_ref()?.upgrade()?;
        Some(parent as NodeRef)
    }
}

/// A file in the project tree, backed by its own [`Document`].
pub struct FileNode {
    name: String,
    path: String,
    parent: Weak<DirectoryNode>,
    document: Rc<Document>,
}

impl GraphNode for FileNode {
    fn node_name(&self) -> String {
        self.name.clone()
    }

    fn node_tags(&self) -> Vec<String> {
        vec!["File".to_string()]
    }
}

impl Addressed for FileNode {
    fn address(&self) -> String {
        format!("/{}", self.path)
    }
}

impl TreeNode for FileNode {
    /// Files have no structural children; language views reach into them
    /// through dynamic types.
    fn children(&self) -> Vec<NodeRef> {
        Vec::new()
    }

    fn property(&self, key: &str) -> Option<String> {
        match key {
            "name" => Some(self.name.clone()),
            "path" => Some(self.path.clone()),
            "extension" => self.extension(),
            _ => None,
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

    fn as_file(&self) -> Option<&dyn FileArtifact> {
        Some(self)
    }

    fn into_parent_aware(self: Rc<Self>) -> Option<Rc<dyn ParentAwareTreeNode>> {
        Some(self)
    }

    fn into_text(self: Rc<Self>) -> Option<Rc<dyn TextTreeNode>> {
        Some(self)
    }

    fn into_file(self: Rc<Self>) -> Option<Rc<dyn FileArtifact>> {
        Some(self)
    }
}

impl ParentAwareTreeNode for FileNode {
    fn parent(&self) -> Option<NodeRef> {
        let parent = self.parent.upgrade()?;
        Some(parent as NodeRef)
    }
}

impl TextTreeNode for FileNode {
    fn value(&self) -> String {
        self.document.content()
    }

    fn update(&self, new_value: &str) -> Result<(), NodeError> {
        self.document.replace_all(new_value);
        Ok(())
    }

    fn format_info(&self) -> Option<FormatInfo> {
        Some(
            self.document
                .with_content(|text| FormatInfo::for_span(text, 0..text.len())),
        )
    }
}

impl FileArtifact for FileNode {
    fn path(&self) -> String {
        self.path.clone()
    }

    fn document(&self) -> Rc<Document> {
        self.document.clone()
    }
}
