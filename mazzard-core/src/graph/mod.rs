//! Dependency Graph Storage
//!
//! Every wrapped value owns two tables:
//!
//! - a [`DependencyRegistry`]: for each dependency slot (a key's value, a
//!   key's presence, or the key set), the reactions that read it;
//! - a [`ValueCache`]: for each key, the last value handed out.
//!
//! The graph is distributed rather than centralized: edges live with the
//! wrapped value they describe, and each reaction remembers (weakly) which
//! slots it joined so it can leave them before its next run. When a wrapped
//! value is dropped, its edges go with it.
//!
//! # Invariants
//!
//! 1. A slot is emptied when it is invalidated; the reactions in it are
//!    scheduled exactly once each.
//!
//! 2. A cache entry is removed before the slot for its key is notified, so
//!    a reaction re-reading the key during notification sees fresh state.

mod cache;
mod registry;

pub use cache::ValueCache;
pub use registry::{Dependency, DependencyRegistry};

pub(crate) use registry::track;
