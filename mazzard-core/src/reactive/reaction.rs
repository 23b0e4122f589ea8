//! Reaction Implementation
//!
//! A Reaction is a re-runnable computation that re-executes whenever a key
//! it read changes.
//!
//! # How Reactions Work
//!
//! 1. `observe` creates a reaction and runs it immediately to establish its
//!    initial dependencies.
//!
//! 2. Every read of a wrapped value during the run registers the reaction
//!    against the key that was read.
//!
//! 3. When one of those keys is written, the reaction is scheduled: it runs
//!    at once, or when the outermost batch finishes.
//!
//! 4. Before re-running, the reaction leaves every dependency set it joined
//!    last time. Only keys read during the new run count, so a branch that
//!    is no longer taken can never trigger a spurious re-run.
//!
//! # Lifecycle
//!
//! Scheduled → Running → Idle → (Scheduled again | Stopped). Stopping is
//! permanent and idempotent; it may happen inside the reaction's own body.
//! Running a stopped reaction does nothing.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use super::context::ReactiveContext;
use crate::error::Result;
use crate::graph::{Dependency, DependencyRegistry};

/// Unique identifier for a reaction.
///
/// Used to deduplicate dependency sets and the pending set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReactionId(u64);

impl ReactionId {
    /// Generate a new unique reaction ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ReactionId {
    fn default() -> Self {
        Self::new()
    }
}

type Body = dyn Fn(&Stop) -> Result<()>;

/// A dependency set this reaction joined during its last run.
struct Source {
    registry: Weak<RefCell<DependencyRegistry>>,
    dependency: Dependency,
}

struct ReactionInner {
    id: ReactionId,
    body: Rc<Body>,
    live: Cell<bool>,
    sources: RefCell<SmallVec<[Source; 4]>>,
    run_count: Cell<usize>,
    /// Owned by a cache entry rather than by user code.
    computation: bool,
}

/// A re-runnable computation subscribed to the keys it reads.
///
/// Cloning shares the reaction.
#[derive(Clone)]
pub struct Reaction {
    inner: Rc<ReactionInner>,
}

impl Reaction {
    /// Create a reaction without running it.
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&Stop) -> Result<()> + 'static,
    {
        Self::build(Rc::new(body), false)
    }

    /// Create the private reaction keeping one cache entry fresh.
    ///
    /// Computations are never deferred: when a key they read changes they
    /// refresh right away, so user reactions flushed afterwards never see a
    /// stale cached value.
    pub(crate) fn computation<F>(body: F) -> Self
    where
        F: Fn(&Stop) -> Result<()> + 'static,
    {
        Self::build(Rc::new(body), true)
    }

    fn build(body: Rc<Body>, computation: bool) -> Self {
        Self {
            inner: Rc::new(ReactionInner {
                id: ReactionId::new(),
                body,
                live: Cell::new(true),
                sources: RefCell::new(SmallVec::new()),
                run_count: Cell::new(0),
                computation,
            }),
        }
    }

    pub fn id(&self) -> ReactionId {
        self.inner.id
    }

    /// Run the body with this reaction as the active reaction.
    ///
    /// A stopped reaction returns `Ok(())` without running.
    pub fn run(&self) -> Result<()> {
        if self.is_stopped() {
            return Ok(());
        }
        let _ctx = ReactiveContext::enter(self.clone())?;
        self.clear_sources();
        self.inner.run_count.set(self.inner.run_count.get() + 1);

        // The body may re-trigger this very reaction, so call a clone.
        let body = Rc::clone(&self.inner.body);
        body(&self.stop_handle())
    }

    /// Run `f` with this reaction active, without running the body.
    ///
    /// Used for a cache entry's first computation, whose later refreshes go
    /// through [`run`](Reaction::run).
    pub(crate) fn track<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let _ctx = ReactiveContext::enter(self.clone())?;
        self.clear_sources();
        f()
    }

    /// Disable the reaction for good and leave every dependency set.
    pub fn stop(&self) {
        if self.inner.live.replace(false) {
            tracing::debug!(reaction = ?self.id(), "reaction stopped");
            self.clear_sources();
        }
    }

    pub fn is_stopped(&self) -> bool {
        !self.inner.live.get()
    }

    pub(crate) fn is_computation(&self) -> bool {
        self.inner.computation
    }

    /// Number of times the body has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Number of dependency sets joined during the last run.
    pub fn dependency_count(&self) -> usize {
        self.inner.sources.borrow().len()
    }

    pub fn stop_handle(&self) -> Stop {
        Stop {
            reaction: self.clone(),
        }
    }

    pub(crate) fn record_source(
        &self,
        registry: Weak<RefCell<DependencyRegistry>>,
        dependency: Dependency,
    ) {
        self.inner.sources.borrow_mut().push(Source {
            registry,
            dependency,
        });
    }

    fn clear_sources(&self) {
        let sources = std::mem::take(&mut *self.inner.sources.borrow_mut());
        for source in sources {
            if let Some(registry) = source.registry.upgrade() {
                registry
                    .borrow_mut()
                    .unsubscribe(&source.dependency, self.id());
            }
        }
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("id", &self.id())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Handle that permanently stops a reaction.
///
/// Returned by [`observe`] and handed to the reaction body on every run.
#[derive(Clone, Debug)]
pub struct Stop {
    reaction: Reaction,
}

impl Stop {
    pub fn stop(&self) {
        self.reaction.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.reaction.is_stopped()
    }

    pub fn id(&self) -> ReactionId {
        self.reaction.id()
    }

    pub fn reaction(&self) -> &Reaction {
        &self.reaction
    }
}

/// Register `procedure` as a reaction and run it once right away.
///
/// The procedure receives its own [`Stop`] handle. If the first run fails,
/// the reaction is stopped and the error returned.
///
/// # Memory
///
/// Every key the reaction read holds it, and it holds whatever its body
/// captured. A body capturing the wrapper it reads is therefore a reference
/// cycle: dropping the handles does not free either side. Call
/// [`Stop::stop`] to release them.
///
/// # Example
///
/// ```rust,ignore
/// let state = wrap(Record::new());
/// let state = state.as_observable().unwrap().clone();
///
/// let stop = observe(move |_| {
///     println!("x is {:?}", state.read("x")?);
///     Ok(())
/// })?;
/// ```
pub fn observe<F>(procedure: F) -> Result<Stop>
where
    F: Fn(&Stop) -> Result<()> + 'static,
{
    let reaction = Reaction::new(procedure);
    if let Err(err) = reaction.run() {
        reaction.stop();
        return Err(err);
    }
    Ok(reaction.stop_handle())
}
