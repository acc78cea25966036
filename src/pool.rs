//! Thread-local parser pooling.
//!
//! Views reparse their document after every mutation, so parsers are kept
//! per thread and per language instead of being created for each rebuild.

use crate::ts::{Language, LanguageParser, TreeSitterError};
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

thread_local! {
    static PARSERS: RefCell<HashMap<Language, LanguageParser>> = RefCell::new(HashMap::new());
}

/// Execute `f` with the pooled parser for `language`, creating it on first use.
pub fn with_parser<F, R>(language: Language, f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut LanguageParser) -> R,
{
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(language) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(LanguageParser::new(language)?),
        };
        Ok(f(parser))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_parser_is_reused_per_language() {
        let first = with_parser(Language::Yaml, |p| p.language()).unwrap();
        let second = with_parser(Language::Rust, |p| p.language()).unwrap();
        assert_eq!(first, Language::Yaml);
        assert_eq!(second, Language::Rust);
        PARSERS.with(|cell| assert!(cell.borrow().len() >= 2));
    }
}
