//! Shared text buffers behind text-backed nodes.
//!
//! A [`Document`] is the single place text changes. File nodes, language view
//! nodes and microgrammar matches over a file all hold the same `Rc<Document>`,
//! so one mutation is visible to every view and bumps the one generation they
//! all check their caches against.

use crate::edit::{EditError, EditResult, TextEdit};
use crate::invalidation::Generation;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;
use tracing::debug;

pub struct Document {
    path: String,
    content: RefCell<String>,
    generation: Generation,
    dirty: Cell<bool>,
    attachments: RefCell<HashMap<String, Rc<dyn Any>>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("path", &self.path)
            .field("len", &self.content.borrow().len())
            .field("generation", &self.generation.current())
            .field("dirty", &self.dirty.get())
            .finish()
    }
}

impl Document {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            path: path.into(),
            content: RefCell::new(content.into()),
            generation: Generation::new(),
            dirty: Cell::new(false),
            attachments: RefCell::new(HashMap::new()),
        })
    }

    /// Project-relative path of the buffer.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> String {
        self.content.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.content.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.borrow().is_empty()
    }

    /// Borrow the current text without cloning it.
    pub fn with_content<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(&self.content.borrow())
    }

    pub fn slice(&self, span: Range<usize>) -> Option<String> {
        self.content.borrow().get(span).map(str::to_string)
    }

    pub fn generation(&self) -> u64 {
        self.generation.current()
    }

    /// True once the buffer has been mutated since it was created or marked clean.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn mark_clean(&self) {
        self.dirty.set(false);
    }

    /// Apply a verified span edit. Bumps the generation when text changes.
    pub fn apply(&self, edit: &TextEdit) -> Result<EditResult, EditError> {
        let result = edit.apply_to(&self.content.borrow())?;
        if let EditResult::Applied { text, .. } = &result {
            *self.content.borrow_mut() = text.clone();
            self.touch();
            debug!(
                path = %self.path,
                span = ?edit.span(),
                generation = self.generation(),
                "applied text edit"
            );
        }
        Ok(result)
    }

    /// Replace the whole buffer. Bumps the generation when text changes.
    pub fn replace_all(&self, new_content: &str) -> bool {
        if *self.content.borrow() == new_content {
            return false;
        }
        *self.content.borrow_mut() = new_content.to_string();
        self.touch();
        debug!(path = %self.path, generation = self.generation(), "replaced document content");
        true
    }

    fn touch(&self) {
        self.generation.bump();
        self.dirty.set(true);
    }

    /// Per-document state owned by other modules (e.g. language views), created on demand.
    ///
    /// Attachments must not hold an `Rc` back to this document.
    pub fn attachment<T: 'static>(&self, key: &str, init: impl FnOnce() -> T) -> Rc<T> {
        if let Some(existing) = self.attachments.borrow().get(key) {
            if let Ok(value) = Rc::clone(existing).downcast::<T>() {
                return value;
            }
        }
        let value = Rc::new(init());
        self.attachments
            .borrow_mut()
            .insert(key.to_string(), value.clone() as Rc<dyn Any>);
        value
    }
}
