use crate::expr::ast::Program;
use crate::expr::errors::ParseError;
use crate::tree::{NodeRef, NodeView};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// Anything the engine can evaluate: a plain string or a typed [`PathExpression`].
pub trait Expression {
    /// Expected view of the root node
    type Root: NodeView;
    /// View every match is converted to
    type Output: NodeView;

    fn expression(&self) -> &str;
}

impl Expression for str {
    type Root = NodeRef;
    type Output = NodeRef;

    fn expression(&self) -> &str {
        self
    }
}

impl Expression for String {
    type Root = NodeRef;
    type Output = NodeRef;

    fn expression(&self) -> &str {
        self
    }
}

/// Object encapsulating a path expression. Facilitates reuse and gives the
/// call site a checked root type `R` and element type `N`.
///
/// Carries nothing but the expression text; compilation happens (and is
/// cached) at evaluation time.
pub struct PathExpression<R = NodeRef, N = NodeRef> {
    expression: String,
    _types: PhantomData<fn(R) -> N>,
}

impl<R: NodeView, N: NodeView> PathExpression<R, N> {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            _types: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// Compile eagerly, surfacing syntax errors before first use.
    pub fn compile(&self) -> Result<Rc<Program>, ParseError> {
        crate::cache::get_or_compile_program(&self.expression)
    }
}

impl<R: NodeView, N: NodeView> Expression for PathExpression<R, N> {
    type Root = R;
    type Output = N;

    fn expression(&self) -> &str {
        &self.expression
    }
}

impl<R, N> Clone for PathExpression<R, N> {
    fn clone(&self) -> Self {
        Self {
            expression: self.expression.clone(),
            _types: PhantomData,
        }
    }
}

impl<R, N> fmt::Debug for PathExpression<R, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathExpression")
            .field(&self.expression)
            .finish()
    }
}

impl<R, N> fmt::Display for PathExpression<R, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

impl<R, N> PartialEq for PathExpression<R, N> {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl<R, N> Eq for PathExpression<R, N> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TextTreeNode;

    #[test]
    fn path_expression_carries_only_text() {
        let expr: PathExpression<NodeRef, Rc<dyn TextTreeNode>> =
            PathExpression::new("/*[@name='x.yml']/YamlFile()/group/value");
        assert_eq!(expr.expression(), "/*[@name='x.yml']/YamlFile()/group/value");
        assert_eq!(expr.clone(), expr);
    }

    #[test]
    fn compile_surfaces_errors() {
        let expr: PathExpression = PathExpression::new("/a[");
        assert!(expr.compile().is_err());
        let ok: PathExpression = PathExpression::new("/a");
        assert_eq!(ok.compile().unwrap().steps().len(), 1);
    }
}
