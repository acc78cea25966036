//! In-memory project trees: a root, directories and text files.
//!
//! Each file owns a [`Document`](crate::document::Document); language views
//! and microgrammar matches over the file share it.

pub mod errors;
pub mod loader;
pub mod node;

pub use errors::ProjectError;
pub use node::{DirectoryNode, FileNode};

use crate::config::ProjectConfig;
use crate::tree::{FileArtifact, NodeRef};
use node::ProjectEntry;
use std::path::Path;
use std::rc::Rc;

pub struct Project {
    root: Rc<DirectoryNode>,
}

impl Project {
    pub fn new(name: &str) -> Self {
        Self {
            root: DirectoryNode::root(name),
        }
    }

    /// Load a directory from disk. See [`loader::load_project`].
    pub fn load(dir: impl AsRef<Path>, config: &ProjectConfig) -> Result<Self, ProjectError> {
        loader::load_project(dir.as_ref(), config)
    }

    pub fn name(&self) -> String {
        crate::tree::GraphNode::node_name(&*self.root)
    }

    /// Root node, tagged `Project`, at address `/`.
    pub fn root(&self) -> NodeRef {
        self.root.clone()
    }

    /// Add a file at a `/`-separated project-relative path, creating
    /// intermediate directories.
    pub fn add_file(
        &self,
        path: &str,
        content: impl Into<String>,
    ) -> Result<Rc<dyn FileArtifact>, ProjectError> {
        let segments = split_path(path)?;
        let (file_name, dirs) = segments
            .split_last()
            .ok_or_else(|| ProjectError::InvalidPath {
                path: path.to_string(),
            })?;

        let mut dir = self.root.clone();
        for segment in dirs {
            dir = dir
                .subdirectory(segment)
                .ok_or_else(|| ProjectError::PathConflict {
                    path: path.to_string(),
                })?;
        }
        let file = dir
            .create_file(file_name, content.into())
            .ok_or_else(|| ProjectError::PathConflict {
                path: path.to_string(),
            })?;
        Ok(file)
    }

    pub fn file(&self, path: &str) -> Option<Rc<dyn FileArtifact>> {
        let segments = split_path(path).ok()?;
        let (file_name, dirs) = segments.split_last()?;
        let mut dir = self.root.clone();
        for segment in dirs {
            match dir.entry(segment)? {
                ProjectEntry::Directory(next) => dir = next,
                ProjectEntry::File(_) => return None,
            }
        }
        match dir.entry(file_name)? {
            ProjectEntry::File(file) => Some(file),
            ProjectEntry::Directory(_) => None,
        }
    }

    /// Every file, in path order.
    pub fn files(&self) -> Vec<Rc<dyn FileArtifact>> {
        let mut out = Vec::new();
        collect_files(&self.root, &mut out);
        out
    }

    /// Files whose content changed since they were loaded or marked clean.
    pub fn dirty_files(&self) -> Vec<Rc<dyn FileArtifact>> {
        self.files()
            .into_iter()
            .filter(|file| file.document().is_dirty())
            .collect()
    }
}

fn collect_files(dir: &DirectoryNode, out: &mut Vec<Rc<dyn FileArtifact>>) {
    for entry in dir.entries() {
        match entry {
            ProjectEntry::Directory(sub) => collect_files(&sub, out),
            ProjectEntry::File(file) => out.push(file),
        }
    }
}

fn split_path(path: &str) -> Result<Vec<&str>, ProjectError> {
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let invalid = segments
        .iter()
        .any(|s| s.is_empty() || *s == "." || *s == "..");
    if invalid {
        return Err(ProjectError::InvalidPath {
            path: path.to_string(),
        });
    }
    Ok(segments)
}
