//! Path expression compiler.
//!
//! Expressions are a small XPath-like language exchanged as plain strings
//! between editor scripts and the engine:
//!
//! ```text
//! /*[@name='x.yml']/YamlFile()/group/value
//! /src/Directory()/scala//ScalaFile()
//! //File()
//! ```

pub mod ast;
pub mod errors;
pub mod parser;
pub mod path;

pub use ast::{Axis, NodeTest, Predicate, Program, Step};
pub use errors::ParseError;
pub use parser::compile;
pub use path::{Expression, PathExpression};
