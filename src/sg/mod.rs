//! ast-grep structural patterns as dynamic types.
//!
//! Patterns use ast-grep's metavariable syntax (`$NAME`, `$$$ARGS`, `$_`):
//!
//! ```text
//! $EXPR.unwrap()                  // every unwrap call
//! fn $NAME($$$PARAMS) { $$$BODY } // every function definition
//! ```

pub mod pattern;

pub use pattern::PatternType;
