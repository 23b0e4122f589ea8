//! Value Cache
//!
//! Per-wrapper map from key to the last value handed out for it. A cached
//! value may be a nested wrapper, an action-wrapped function, or a primitive.
//!
//! An entry whose computation read other tracked keys (a getter) also owns
//! that computation: a private reaction that refreshes the entry when those
//! keys change. Removing the entry hands the computation back so the caller
//! can stop it once no cache borrow is held.

use std::collections::HashMap;

use crate::reactive::{Reaction, ReactionId};
use crate::value::{Key, Value};

struct CacheEntry {
    value: Value,
    computation: Option<Reaction>,
}

#[derive(Default)]
pub struct ValueCache {
    entries: HashMap<Key, CacheEntry>,
}

impl ValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Key) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    /// Store a freshly computed value. Returns the computation of the entry
    /// it displaced, if any.
    pub fn insert(
        &mut self,
        key: Key,
        value: Value,
        computation: Option<Reaction>,
    ) -> Option<Reaction> {
        self.entries
            .insert(key, CacheEntry { value, computation })
            .and_then(|old| old.computation)
    }

    /// Replace the value of an existing entry. Returns whether it changed.
    pub fn refresh(&mut self, key: &Key, value: Value) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) if !entry.value.same(&value) => {
                entry.value = value;
                true
            }
            _ => false,
        }
    }

    /// The computation owning the entry for `key`.
    pub fn computation(&self, key: &Key) -> Option<ReactionId> {
        self.entries
            .get(key)
            .and_then(|entry| entry.computation.as_ref().map(Reaction::id))
    }

    /// Drop the entry for `key`, handing back its computation.
    pub fn remove(&mut self, key: &Key) -> Option<Reaction> {
        self.entries.remove(key).and_then(|entry| entry.computation)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut cache = ValueCache::new();
        assert!(cache.get(&Key::from("a")).is_none());

        cache.insert(Key::from("a"), Value::from(1), None);
        assert_eq!(cache.get(&Key::from("a")), Some(Value::from(1)));
        assert!(cache.contains(&Key::from("a")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn refresh_reports_change() {
        let mut cache = ValueCache::new();
        cache.insert(Key::from("a"), Value::from(1), None);

        assert!(!cache.refresh(&Key::from("a"), Value::from(1)));
        assert!(cache.refresh(&Key::from("a"), Value::from(2)));
        assert_eq!(cache.get(&Key::from("a")), Some(Value::from(2)));

        // refreshing a missing entry does not create it
        assert!(!cache.refresh(&Key::from("b"), Value::from(1)));
        assert!(!cache.contains(&Key::from("b")));
    }

    #[test]
    fn remove_hands_back_computation() {
        let mut cache = ValueCache::new();
        let computation = Reaction::new(|_| Ok(()));
        cache.insert(Key::from("a"), Value::Undefined, Some(computation.clone()));

        assert_eq!(cache.computation(&Key::from("a")), Some(computation.id()));
        let removed = cache.remove(&Key::from("a"));
        assert_eq!(removed.map(|r| r.id()), Some(computation.id()));
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_hands_back_displaced_computation() {
        let mut cache = ValueCache::new();
        let old = Reaction::new(|_| Ok(()));
        cache.insert(Key::from("a"), Value::from(1), Some(old.clone()));

        let displaced = cache.insert(Key::from("a"), Value::from(2), None);
        assert_eq!(displaced.map(|r| r.id()), Some(old.id()));
        assert_eq!(cache.computation(&Key::from("a")), None);
    }
}
