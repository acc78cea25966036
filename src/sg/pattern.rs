use crate::cache;
use crate::tree::{NodeError, NodeRef};
use crate::ts::{view_root, AstNode, Language};
use crate::types::TypeProvider;
use ast_grep_core::AstGrep;
use std::rc::Rc;
use tracing::debug;

/// Dynamic type whose members are the view nodes matched by an ast-grep
/// pattern.
///
/// Works from a file of the pattern's language or from any node of its view;
/// only matches inside the context node's span are returned, in document order.
#[derive(Debug, Clone)]
pub struct PatternType {
    name: String,
    language: Language,
    pattern: String,
}

impl PatternType {
    pub fn new(name: impl Into<String>, language: Language, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language,
            pattern: pattern.into(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn scope(&self, context: &NodeRef) -> Result<Option<Rc<AstNode>>, NodeError> {
        if let Some(node) = context.as_any().downcast_ref::<AstNode>() {
            return Ok(node.shared().filter(|n| n.language() == self.language));
        }
        match context.clone().into_file() {
            Some(file) if Language::from_path(&file.path()) == Some(self.language) => {
                Ok(Some(view_root(file, self.language)?))
            }
            _ => Ok(None),
        }
    }
}

impl TypeProvider for PatternType {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn find(&self, context: &NodeRef) -> Result<Vec<NodeRef>, NodeError> {
        let Some(scope) = self.scope(context)? else {
            return Ok(Vec::new());
        };
        let Some(span) = scope.span() else {
            return Ok(Vec::new());
        };

        let document = scope.document();
        let projection = scope.view().projection(document)?;
        let source = document.content();
        let lang = self.language.support_lang();
        let pattern = cache::get_or_compile_pattern(&self.pattern, lang);
        let grep = AstGrep::new(source.as_str(), lang);
        let root = grep.root();

        let mut found = Vec::new();
        for m in root.find_all(&pattern) {
            let node = m.get_node();
            let range = node.range();
            if range.start < span.start || range.end > span.end {
                continue;
            }
            if let Some(index) = projection.find_by_span(&range, &node.kind()) {
                found.push(AstNode::from_entry(
                    document.clone(),
                    scope.view().clone(),
                    scope.owner().clone(),
                    &projection,
                    index,
                ) as NodeRef);
            }
        }
        debug!(
            pattern = %self.pattern,
            context = %context.address(),
            count = found.len(),
            "matched structural pattern"
        );
        Ok(found)
    }
}
