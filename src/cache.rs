//! Thread-local compilation caches.
//!
//! Editor scripts evaluate the same handful of expressions over and over
//! (often once per file inside a `with` callback), so compiled step programs
//! and ast-grep patterns are cached per thread.
//! Each cache is capped at 256 entries; it is cleared when full.

use crate::expr::{compile, ParseError, Program};
use ast_grep_core::Pattern;
use ast_grep_language::SupportLang;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    static PROGRAM_CACHE: RefCell<HashMap<String, Rc<Program>>> =
        RefCell::new(HashMap::new());

    // Key is "<lang_debug>:<pattern_str>" so same pattern string for different
    // languages never collides.
    static PATTERN_CACHE: RefCell<HashMap<String, Pattern>> =
        RefCell::new(HashMap::new());
}

/// Get a compiled step program from cache, or compile and cache it.
///
/// Parse failures are not cached.
pub fn get_or_compile_program(expression: &str) -> Result<Rc<Program>, ParseError> {
    PROGRAM_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();

        if let Some(program) = cache.get(expression) {
            return Ok(program.clone());
        }

        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }

        let program = Rc::new(compile(expression)?);
        cache.insert(expression.to_string(), program.clone());
        Ok(program)
    })
}

/// Get a compiled ast-grep pattern from cache, or compile and cache it.
pub fn get_or_compile_pattern(pattern_str: &str, lang: SupportLang) -> Pattern {
    let cache_key = format!("{lang:?}:{pattern_str}");

    PATTERN_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();

        if let Some(p) = cache.get(&cache_key) {
            return p.clone();
        }

        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }

        let compiled = Pattern::new(pattern_str, lang);
        cache.insert(cache_key, compiled.clone());
        compiled
    })
}

/// Clear both caches (mainly for testing).
pub fn clear_cache() {
    PROGRAM_CACHE.with(|cache| cache.borrow_mut().clear());
    PATTERN_CACHE.with(|cache| cache.borrow_mut().clear());
}

/// Number of cached programs, for monitoring.
pub fn program_cache_size() -> usize {
    PROGRAM_CACHE.with(|cache| cache.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_is_reused() {
        clear_cache();
        let first = get_or_compile_program("/src//File()").unwrap();
        let second = get_or_compile_program("/src//File()").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(program_cache_size(), 1);
    }

    #[test]
    fn parse_errors_are_not_cached() {
        clear_cache();
        assert!(get_or_compile_program("/a[").is_err());
        assert_eq!(program_cache_size(), 0);
    }

    #[test]
    fn cache_is_cleared_at_capacity() {
        clear_cache();
        for i in 0..MAX_CACHE_ENTRIES {
            get_or_compile_program(&format!("/n{i}")).unwrap();
        }
        assert_eq!(program_cache_size(), MAX_CACHE_ENTRIES);
        get_or_compile_program("/overflow").unwrap();
        assert_eq!(program_cache_size(), 1);
    }
}
