//! Dependency Registry
//!
//! Per-wrapper map from a dependency slot to the reactions that read it since
//! it was last invalidated.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::reactive::{Reaction, ReactionId};
use crate::value::Key;

/// A dependency slot of one wrapped value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// The value of a key.
    Value(Key),
    /// Whether a key exists (`has:key`).
    Presence(Key),
    /// The set of keys (`ownKeys`).
    Keys,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Value(key) => write!(f, "{key}"),
            Dependency::Presence(key) => write!(f, "has:{key}"),
            Dependency::Keys => f.write_str("ownKeys"),
        }
    }
}

/// Reactions subscribed to each dependency slot.
///
/// Each set keeps insertion order, which is the order the reactions are
/// scheduled in when the slot is invalidated.
#[derive(Default)]
pub struct DependencyRegistry {
    entries: HashMap<Dependency, IndexMap<ReactionId, Reaction>>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `reaction` to the slot. Returns `false` if it was already there.
    pub fn subscribe(&mut self, dependency: Dependency, reaction: &Reaction) -> bool {
        let set = self.entries.entry(dependency).or_default();
        if set.contains_key(&reaction.id()) {
            return false;
        }
        set.insert(reaction.id(), reaction.clone());
        true
    }

    pub fn unsubscribe(&mut self, dependency: &Dependency, id: ReactionId) {
        if let Some(set) = self.entries.get_mut(dependency) {
            set.shift_remove(&id);
            if set.is_empty() {
                self.entries.remove(dependency);
            }
        }
    }

    /// Empty the slot and return what it held. The entry is gone until the
    /// next read recreates it.
    pub fn take(&mut self, dependency: &Dependency) -> Vec<Reaction> {
        self.entries
            .remove(dependency)
            .map(|set| set.into_values().collect())
            .unwrap_or_default()
    }

    /// Number of reactions subscribed to the slot.
    pub fn dependents(&self, dependency: &Dependency) -> usize {
        self.entries.get(dependency).map_or(0, IndexMap::len)
    }

    /// Total number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.entries.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Subscribe the reaction and let it know, so its next run can leave the
/// slot again.
pub(crate) fn track(
    registry: &Rc<RefCell<DependencyRegistry>>,
    dependency: Dependency,
    reaction: &Reaction,
) {
    let added = registry.borrow_mut().subscribe(dependency.clone(), reaction);
    if added {
        tracing::trace!(reaction = ?reaction.id(), dependency = %dependency, "subscribed");
        reaction.record_source(Rc::downgrade(registry), dependency);
    }
}
