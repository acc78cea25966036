//! pathexpr: query and edit heterogeneous project trees with path expressions
//!
//! A project is a tree of directories and files. Files can be viewed through
//! dynamic types: tree-sitter language views (`RustFile()`, `YamlFile()`),
//! microgrammars matched over text, and ast-grep structural patterns. A path
//! expression walks all of them uniformly:
//!
//! ```text
//! /src/main//JavaFile()//method_declaration[@identifier='main']
//! //File()[@extension='yml']/YamlFile()/services/api/image
//! ```
//!
//! # Architecture
//!
//! Every node mutation compiles down to one primitive, a verified byte-span
//! replacement ([`TextEdit`]) applied to the file's shared [`Document`].
//! Derived structure (parse trees, projections, format info) is stamped
//! with the document generation and rebuilt lazily, so handles obtained
//! before an update re-resolve by address afterwards.
//!
//! # Example
//!
//! ```no_run
//! use pathexpr::{Engine, Project};
//! use pathexpr::tree::TextTreeNode;
//!
//! let project = Project::new("demo");
//! project
//!     .add_file("config.yml", "group:\n  value: queen\n")
//!     .unwrap();
//!
//! let engine = Engine::with_defaults();
//! let value = engine
//!     .scalar(&project.root(), "//YamlFile()/group/value")
//!     .unwrap();
//! value.as_text().unwrap().update("Jefferson Airplane").unwrap();
//! ```

pub mod cache;
pub mod config;
pub mod document;
pub mod edit;
pub mod engine;
pub mod expr;
pub mod invalidation;
pub mod logging;
pub mod pool;
pub mod project;
pub mod sg;
pub mod tree;
pub mod ts;
pub mod types;

// Re-exports
pub use config::{load_from_path, load_from_str, Config, ConfigError, ProjectConfig};
pub use document::Document;
pub use edit::{EditError, EditResult, EditVerification, TextEdit};
pub use engine::{Engine, EngineError, EngineOptions, Match};
pub use expr::{compile, Expression, ParseError, PathExpression, Program};
pub use project::{Project, ProjectError};
pub use sg::PatternType;
pub use tree::{
    FileArtifact, FormatInfo, GraphNode, NodeError, NodeRef, NodeView, ParentAwareTreeNode,
    TextTreeNode, TreeNode,
};
pub use ts::{Language, LanguageType, TreeSitterError};
pub use types::{DynamicType, Microgrammar, MicrogrammarError, TypeProvider, TypeRegistry};
