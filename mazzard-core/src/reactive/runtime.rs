//! Reactive Runtime
//!
//! The runtime is the batch coordinator. It decides whether a scheduled
//! reaction runs right away or waits for the outermost batch to finish.
//!
//! # How It Works
//!
//! 1. Entering a batch (an explicit [`Runtime::batch`] or [`action`] call,
//!    or the implicit batch around every single write) increments a depth
//!    counter; leaving decrements it.
//!
//! 2. A reaction scheduled while the depth is above zero joins the pending
//!    set. The set keeps insertion order and ignores duplicates, so a
//!    reaction depending on several changed keys still runs once.
//!
//! 3. When the depth returns to zero the pending set is taken (leaving it
//!    empty) and every reaction in it runs in insertion order. The depth is
//!    zero during that flush, so anything a flushed reaction schedules runs
//!    immediately, as its own flush.
//!
//! 4. Nested batches share the counter and the set; only the outermost one
//!    flushes.
//!
//! # Thread Safety
//!
//! The state is thread-local. Everything here is synchronous: when a call
//! returns, every reaction it caused has already run.

use std::cell::RefCell;

use indexmap::IndexMap;

use super::reaction::{Reaction, ReactionId};
use crate::error::Result;

thread_local! {
    static BATCH: RefCell<BatchState> = RefCell::new(BatchState::default());
}

#[derive(Default)]
struct BatchState {
    depth: usize,
    pending: IndexMap<ReactionId, Reaction>,
}

/// Guard for one batch level. Dropping it leaves the level, also on panic.
struct BatchScope;

impl BatchScope {
    fn enter() -> Self {
        BATCH.with(|batch| batch.borrow_mut().depth += 1);
        BatchScope
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        BATCH.with(|batch| batch.borrow_mut().depth -= 1);
    }
}

/// The reactive runtime.
///
/// A namespace over the thread's batch state.
pub struct Runtime;

impl Runtime {
    /// Run `procedure` inside one batch.
    ///
    /// If this is the outermost batch, pending reactions run before the
    /// call returns, even when `procedure` failed part way: whatever it
    /// already wrote has been committed. The procedure's own error takes
    /// precedence over an error raised by the flush.
    pub fn batch<T>(procedure: impl FnOnce() -> Result<T>) -> Result<T> {
        let result = {
            let _scope = BatchScope::enter();
            procedure()
        };
        let flushed = if Self::is_batching() {
            Ok(())
        } else {
            Self::flush()
        };
        let value = result?;
        flushed.map(|()| value)
    }

    /// Check if a batch is open on this thread.
    pub fn is_batching() -> bool {
        Self::batch_depth() > 0
    }

    pub fn batch_depth() -> usize {
        BATCH.with(|batch| batch.borrow().depth)
    }

    /// Number of reactions waiting for the outermost batch to finish.
    pub fn pending_count() -> usize {
        BATCH.with(|batch| batch.borrow().pending.len())
    }

    /// Run `reaction` now, or queue it if a batch is open.
    pub(crate) fn schedule(reaction: Reaction) -> Result<()> {
        let deferred = BATCH.with(|batch| {
            let mut batch = batch.borrow_mut();
            if batch.depth > 0 {
                batch.pending.entry(reaction.id()).or_insert_with(|| reaction.clone());
                true
            } else {
                false
            }
        });
        if deferred {
            tracing::trace!(reaction = ?reaction.id(), "reaction deferred to end of batch");
            Ok(())
        } else {
            reaction.run()
        }
    }

    /// Schedule every reaction, in order. All of them are scheduled even if
    /// one fails; the first error is returned.
    pub(crate) fn schedule_all(reactions: impl IntoIterator<Item = Reaction>) -> Result<()> {
        let mut outcome = Ok(());
        for reaction in reactions {
            if let Err(err) = Self::schedule(reaction) {
                if outcome.is_ok() {
                    outcome = Err(err);
                }
            }
        }
        outcome
    }

    fn flush() -> Result<()> {
        let pending = BATCH.with(|batch| std::mem::take(&mut batch.borrow_mut().pending));
        if pending.is_empty() {
            return Ok(());
        }
        tracing::trace!(count = pending.len(), "flushing pending reactions");
        Self::schedule_all(pending.into_values())
    }
}

/// Turn `procedure` into a function that runs it inside one batch.
///
/// Arguments are passed as a single value; use a tuple for several.
///
/// # Example
///
/// ```rust,ignore
/// let update = action(move |(a, b): (i32, i32)| {
///     state.write("a", a)?;
///     state.write("b", b)
/// });
/// update((1, 2))?; // reactions reading `a` and `b` run once
/// ```
pub fn action<A, R, F>(procedure: F) -> impl Fn(A) -> Result<R>
where
    F: Fn(A) -> Result<R>,
{
    move |args| Runtime::batch(|| procedure(args))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::error::ReactiveError;

    fn counting() -> (Rc<Cell<usize>>, Reaction) {
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let reaction = Reaction::new(move |_| {
            count_clone.set(count_clone.get() + 1);
            Ok(())
        });
        (count, reaction)
    }

    #[test]
    fn schedule_runs_immediately_outside_batch() {
        let (count, reaction) = counting();
        Runtime::schedule(reaction).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn batch_defers_and_deduplicates() {
        let (count, reaction) = counting();

        Runtime::batch(|| {
            Runtime::schedule(reaction.clone())?;
            Runtime::schedule(reaction.clone())?;
            assert_eq!(count.get(), 0);
            assert_eq!(Runtime::pending_count(), 1);
            Ok(())
        })
        .unwrap();

        assert_eq!(count.get(), 1);
        assert_eq!(Runtime::pending_count(), 0);
        assert!(!Runtime::is_batching());
    }

    #[test]
    fn only_outermost_batch_flushes() {
        let (count, reaction) = counting();

        Runtime::batch(|| {
            Runtime::batch(|| Runtime::schedule(reaction.clone()))?;
            assert_eq!(Runtime::batch_depth(), 1);
            assert_eq!(count.get(), 0);
            Ok(())
        })
        .unwrap();

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn flush_preserves_insertion_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let reactions: Vec<Reaction> = (0..3)
            .map(|n| {
                let order = order.clone();
                Reaction::new(move |_| {
                    order.borrow_mut().push(n);
                    Ok(())
                })
            })
            .collect();

        Runtime::batch(|| {
            Runtime::schedule(reactions[2].clone())?;
            Runtime::schedule(reactions[0].clone())?;
            Runtime::schedule(reactions[2].clone())?;
            Runtime::schedule(reactions[1].clone())
        })
        .unwrap();

        assert_eq!(*order.borrow(), vec![2, 0, 1]);
    }

    #[test]
    fn failing_procedure_still_flushes() {
        let (count, reaction) = counting();

        let result: Result<()> = Runtime::batch(|| {
            Runtime::schedule(reaction.clone())?;
            Err(ReactiveError::failed("half done"))
        });

        assert!(result.is_err());
        assert_eq!(count.get(), 1);
        assert_eq!(Runtime::batch_depth(), 0);
    }

    #[test]
    fn flush_runs_everything_and_reports_first_error() {
        let failing = Reaction::new(|_| Err(ReactiveError::failed("first")));
        let (count, reaction) = counting();

        let result = Runtime::batch(|| {
            Runtime::schedule(failing.clone())?;
            Runtime::schedule(reaction.clone())
        });

        assert_eq!(result.unwrap_err().to_string(), "first");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn action_wraps_in_batch() {
        let (count, reaction) = counting();
        let update = action(move |times: usize| {
            for _ in 0..times {
                Runtime::schedule(reaction.clone())?;
            }
            Ok(Runtime::is_batching())
        });

        assert!(update(3).unwrap());
        assert_eq!(count.get(), 1);
    }
}
