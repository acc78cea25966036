//! Generation-stamped caches for derived tree state.
//!
//! Text-backed nodes derive their children and format info from a buffer.
//! Each buffer owns a [`Generation`] that every mutation bumps; derived values
//! live in [`Cached`] slots stamped with the generation they were built at, so
//! a stale stamp forces a rebuild on the next access instead of handing out
//! structure computed from old text.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shared mutation counter for one text buffer.
#[derive(Debug, Clone, Default)]
pub struct Generation(Rc<Cell<u64>>);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.0.get()
    }

    /// Mark everything derived from the buffer as stale. Returns the new generation.
    pub fn bump(&self) -> u64 {
        let next = self.0.get().wrapping_add(1);
        self.0.set(next);
        next
    }
}

/// A lazily built value valid for exactly one generation.
#[derive(Debug)]
pub struct Cached<T> {
    slot: RefCell<Option<(u64, T)>>,
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self {
            slot: RefCell::new(None),
        }
    }
}

impl<T: Clone> Cached<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value if it was built at `generation`, else rebuild it.
    pub fn get_or_build(&self, generation: u64, build: impl FnOnce() -> T) -> T {
        if let Some(value) = self.get(generation) {
            return value;
        }
        let value = build();
        *self.slot.borrow_mut() = Some((generation, value.clone()));
        value
    }

    /// Fallible variant of [`Cached::get_or_build`]; errors are not cached.
    pub fn try_get_or_build<E>(
        &self,
        generation: u64,
        build: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        if let Some(value) = self.get(generation) {
            return Ok(value);
        }
        let value = build()?;
        *self.slot.borrow_mut() = Some((generation, value.clone()));
        Ok(value)
    }

    fn get(&self, generation: u64) -> Option<T> {
        let slot = self.slot.borrow();
        match slot.as_ref() {
            Some((stamp, value)) if *stamp == generation => Some(value.clone()),
            _ => None,
        }
    }

    pub fn is_fresh(&self, generation: u64) -> bool {
        matches!(self.slot.borrow().as_ref(), Some((stamp, _)) if *stamp == generation)
    }

    /// Drop the cached value eagerly.
    pub fn invalidate(&self) {
        self.slot.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_is_shared_between_clones() {
        let generation = Generation::new();
        let other = generation.clone();
        assert_eq!(generation.bump(), 1);
        assert_eq!(other.current(), 1);
    }

    #[test]
    fn cached_value_reused_within_generation() {
        let cached = Cached::new();
        let mut builds = 0;
        let first = cached.get_or_build(0, || {
            builds += 1;
            vec![1, 2]
        });
        let second = cached.get_or_build(0, || {
            builds += 1;
            vec![3]
        });
        assert_eq!(first, second);
        assert_eq!(builds, 1);
    }

    #[test]
    fn stale_generation_rebuilds() {
        let generation = Generation::new();
        let cached = Cached::new();
        cached.get_or_build(generation.current(), || "old".to_string());
        generation.bump();
        assert!(!cached.is_fresh(generation.current()));
        let value = cached.get_or_build(generation.current(), || "new".to_string());
        assert_eq!(value, "new");
    }

    #[test]
    fn invalidate_forces_rebuild() {
        let cached = Cached::new();
        cached.get_or_build(3, || 1);
        cached.invalidate();
        assert_eq!(cached.get_or_build(3, || 2), 2);
    }

    #[test]
    fn failed_build_is_not_cached() {
        let cached: Cached<u32> = Cached::new();
        let err: Result<u32, &str> = cached.try_get_or_build(0, || Err("boom"));
        assert!(err.is_err());
        assert_eq!(cached.try_get_or_build::<&str>(0, || Ok(7)), Ok(7));
    }
}
