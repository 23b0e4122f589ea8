//! Reactive Context
//!
//! The reactive context tracks which reaction is currently running. This
//! enables automatic dependency tracking: when a wrapped value is read, the
//! current reaction is registered as a dependent of the key that was read.
//!
//! # Implementation
//!
//! A thread-local slot holds the active reaction. Entering a context swaps
//! the new reaction in and remembers the previous one; dropping the guard
//! puts the previous one back. Nested runs therefore form an implicit call
//! stack through save/restore, and the slot is restored even if the
//! computation panics.
//!
//! The same state counts, per reaction, how many of its runs are on the
//! stack. A reaction that keeps re-triggering itself is refused once it is
//! nested inside itself the configured number of times. Chains of distinct
//! reactions nest freely.

use std::cell::RefCell;
use std::collections::HashMap;

use super::{Reaction, ReactionId};
use crate::config::Config;
use crate::error::{ReactiveError, Result};

thread_local! {
    static CONTEXT: RefCell<ContextState> = RefCell::new(ContextState::default());
}

#[derive(Default)]
struct ContextState {
    /// The reaction whose reads are being tracked, if any.
    active: Option<Reaction>,
    /// Number of reaction runs currently on the call stack.
    depth: usize,
    /// Runs on the call stack, per reaction.
    running: HashMap<ReactionId, usize>,
}

/// Guard that restores the previous context when dropped.
pub struct ReactiveContext {
    previous: Option<Reaction>,
    counted: Option<ReactionId>,
}

impl ReactiveContext {
    /// Make `reaction` the active reaction until the guard is dropped.
    ///
    /// Fails without changing anything when `reaction` is already nested
    /// inside itself as often as the limit allows.
    pub(crate) fn enter(reaction: Reaction) -> Result<Self> {
        let limit = Config::max_depth();
        let id = reaction.id();
        CONTEXT.with(|context| {
            let mut context = context.borrow_mut();
            let runs = context.running.entry(id).or_insert(0);
            if *runs >= limit {
                tracing::debug!(reaction = ?id, limit, "reaction re-entry limit reached");
                return Err(ReactiveError::RecursionLimit { limit });
            }
            *runs += 1;
            context.depth += 1;
            let previous = context.active.replace(reaction);
            Ok(Self {
                previous,
                counted: Some(id),
            })
        })
    }

    /// Clear the active reaction until the guard is dropped, so reads in
    /// between subscribe nothing.
    pub fn suspend() -> Self {
        let previous = CONTEXT.with(|context| context.borrow_mut().active.take());
        Self {
            previous,
            counted: None,
        }
    }

    /// Check if a reaction is being tracked.
    pub fn is_active() -> bool {
        CONTEXT.with(|context| context.borrow().active.is_some())
    }

    /// The reaction being tracked, if any.
    pub fn current() -> Option<Reaction> {
        CONTEXT.with(|context| context.borrow().active.clone())
    }

    /// How many reaction runs are nested right now.
    pub fn depth() -> usize {
        CONTEXT.with(|context| context.borrow().depth)
    }

    /// How many runs of `id` are on the stack right now.
    pub fn runs_of(id: ReactionId) -> usize {
        CONTEXT.with(|context| context.borrow().running.get(&id).copied().unwrap_or(0))
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let counted = self.counted.take();
        CONTEXT.with(|context| {
            let mut context = context.borrow_mut();
            context.active = previous;
            if let Some(id) = counted {
                context.depth -= 1;
                if let Some(runs) = context.running.get_mut(&id) {
                    *runs -= 1;
                    if *runs == 0 {
                        context.running.remove(&id);
                    }
                }
            }
        });
    }
}

/// Run `f` without tracking: nothing it reads becomes a dependency of the
/// surrounding reaction.
pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
    let _ctx = ReactiveContext::suspend();
    f()
}
