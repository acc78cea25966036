use crate::ts::errors::TreeSitterError;
use crate::ts::language::Language;
use ast_grep_language::LanguageExt;
use tree_sitter::{Parser, Tree};

/// Tree-sitter parser bound to one language's grammar.
pub struct LanguageParser {
    parser: Parser,
    language: Language,
}

impl LanguageParser {
    pub fn new(language: Language) -> Result<Self, TreeSitterError> {
        let mut parser = Parser::new();
        // Grammars come from ast-grep-language so both stay on one tree-sitter version
        let ts_lang = language.support_lang().get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| TreeSitterError::LanguageSet {
                language: language.to_string(),
            })?;

        Ok(Self { parser, language })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Parse `source`; `path` is only used for error reporting.
    pub fn parse(&mut self, path: &str, source: &str) -> Result<Tree, TreeSitterError> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| TreeSitterError::ParseFailed {
                path: path.to_string(),
                language: self.language.to_string(),
            })
    }
}

/// Number of ERROR or MISSING nodes under `node`.
pub fn count_error_nodes(node: tree_sitter::Node<'_>) -> usize {
    let own = usize::from(node.is_error() || node.is_missing());
    let mut cursor = node.walk();
    let below: usize = node
        .children(&mut cursor)
        .map(count_error_nodes)
        .sum();
    own + below
}
