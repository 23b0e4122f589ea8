//! Observable Wrappers
//!
//! An [`Observable`] wraps one plain record or sequence. Every access goes
//! through it:
//!
//! - `read` subscribes the active reaction to the key and serves the value
//!   from the wrapper's cache, computing it on a miss;
//! - `write` commits the raw change inside an implicit batch and notifies the
//!   reactions that read the key;
//! - `has` and `keys` subscribe to the key's presence and to the key set, so
//!   adding or removing keys re-runs the reactions that looked;
//! - `delete_key` removes the key and notifies like a write to undefined.
//!
//! # Caching
//!
//! A cache miss computes the value under a private computation reaction.
//! Nested records come back wrapped (once: a raw value always maps to the
//! same wrapper), sequences and foreign objects go through the plugin, and
//! functions come back as actions. If computing read other tracked keys, as
//! a getter does, the computation stays attached to the cache entry and
//! refreshes it when those keys change, notifying readers only if the
//! refreshed value differs.
//!
//! A failed computation leaves nothing behind: the next read retries.
//!
//! # Ownership
//!
//! The wrapper holds its raw target; the raw value only points back weakly.
//! Reactions are held by the dependency sets they joined, so a reaction
//! capturing a wrapper it reads keeps that wrapper alive until the reaction
//! is stopped.

mod plugin;
mod sequence;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

pub use plugin::{DefaultPlugin, NoPlugin, Plugin};

use crate::error::{ReactiveError, Result};
use crate::graph::{self, Dependency, DependencyRegistry, ValueCache};
use crate::reactive::{ReactiveContext, Reaction, ReactionId, Runtime};
use crate::value::{Key, List, Property, Record, Value};

/// The raw value behind a wrapper.
#[derive(Clone, Debug)]
pub enum Target {
    Record(Record),
    List(List),
}

pub(crate) struct Inner {
    target: Target,
    plugin: Rc<dyn Plugin>,
    cache: RefCell<ValueCache>,
    registry: Rc<RefCell<DependencyRegistry>>,
}

/// A tracked record or sequence.
///
/// Cloning shares the wrapper.
#[derive(Clone)]
pub struct Observable {
    inner: Rc<Inner>,
}

/// The property traps every wrapper implements.
pub trait PropertyAccess {
    fn read(&self, key: Key) -> Result<Value>;
    fn write(&self, key: Key, value: Value) -> Result<()>;
    fn has(&self, key: Key) -> bool;
    fn delete_key(&self, key: Key) -> Result<bool>;
    fn keys(&self) -> Vec<Key>;
}

/// Wrap `value` with the [`DefaultPlugin`].
///
/// Records are wrapped, sequences and foreign objects go to the plugin,
/// everything else (including values that are already wrapped) comes back
/// unchanged.
pub fn wrap(value: impl Into<Value>) -> Value {
    wrap_with(value, Rc::new(DefaultPlugin))
}

/// Wrap `value` with `plugin`, which nested wrappers inherit.
pub fn wrap_with(value: impl Into<Value>, plugin: Rc<dyn Plugin>) -> Value {
    match value.into() {
        Value::Record(record) => Value::Object(Observable::for_record(&record, plugin)),
        value @ (Value::List(_) | Value::Foreign(_)) => plugin.wrap(value, &plugin),
        other => other,
    }
}

impl Observable {
    /// The wrapper of `record`, creating it if there is none.
    pub fn for_record(record: &Record, plugin: Rc<dyn Plugin>) -> Self {
        Self::canonical(&record.0.wrapper, || Target::Record(record.clone()), plugin)
    }

    /// The wrapper of `list`, creating it if there is none.
    pub fn for_list(list: &List, plugin: Rc<dyn Plugin>) -> Self {
        Self::canonical(&list.0.wrapper, || Target::List(list.clone()), plugin)
    }

    fn canonical(
        slot: &RefCell<Weak<Inner>>,
        target: impl FnOnce() -> Target,
        plugin: Rc<dyn Plugin>,
    ) -> Self {
        if let Some(inner) = slot.borrow().upgrade() {
            return Self { inner };
        }
        let inner = Rc::new(Inner {
            target: target(),
            plugin,
            cache: RefCell::new(ValueCache::new()),
            registry: Rc::new(RefCell::new(DependencyRegistry::new())),
        });
        *slot.borrow_mut() = Rc::downgrade(&inner);
        tracing::trace!(sequence = matches!(inner.target, Target::List(_)), "wrapped value");
        Self { inner }
    }

    /// The raw value. Reading it directly is not tracked.
    pub fn target(&self) -> &Target {
        &self.inner.target
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.inner.target, Target::List(_))
    }

    pub fn plugin(&self) -> &Rc<dyn Plugin> {
        &self.inner.plugin
    }

    pub fn ptr_eq(&self, other: &Observable) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------------
    // Traps
    // ------------------------------------------------------------------------

    /// Read `key`, subscribing the active reaction to its value.
    pub fn read(&self, key: impl Into<Key>) -> Result<Value> {
        let key = key.into();
        let cached = self.inner.cache.borrow().get(&key);
        let value = match cached {
            Some(value) => value,
            None => self.compute(&key)?,
        };
        self.track(Dependency::Value(key));
        Ok(value)
    }

    /// Write `key`. Writing the value the key already holds does nothing.
    pub fn write(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        match &self.inner.target {
            Target::Record(record) => match record.property(&key) {
                Some(Property::Accessor { set, .. }) => self.write_accessor(key, set, value),
                _ => self.write_field(record, key, value),
            },
            Target::List(list) => match key {
                Key::Index(index) if index < List::MAX_LEN => {
                    self.write_index(list, index, value)
                }
                key if key.is_length() => self.write_length(list, value),
                key => Err(ReactiveError::InvalidSequenceKey { key }),
            },
        }
    }

    /// Whether `key` exists, subscribing the active reaction to the answer.
    pub fn has(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        let present = match &self.inner.target {
            Target::Record(record) => record.contains_key(&key),
            Target::List(list) => match &key {
                Key::Index(index) => list.contains_index(*index),
                key => key.is_length(),
            },
        };
        self.track(Dependency::Presence(key));
        present
    }

    /// Remove `key`. Returns whether it existed.
    pub fn delete_key(&self, key: impl Into<Key>) -> Result<bool> {
        let key = key.into();
        match &self.inner.target {
            Target::Record(record) => {
                let Some(property) = record.property(&key) else {
                    return Ok(false);
                };
                let changed = match property {
                    Property::Accessor { .. } => true,
                    Property::Data(raw) => !self.cached_or(&key, raw).is_undefined(),
                };
                Runtime::batch(|| {
                    record.remove(&key);
                    self.removed(key, changed)
                })?;
                Ok(true)
            }
            Target::List(list) => match key {
                Key::Index(index) if list.contains_index(index) => {
                    let changed = !self.cached_or(&key, list.get(index)).is_undefined();
                    Runtime::batch(|| {
                        list.delete(index);
                        self.removed(key, changed)
                    })?;
                    Ok(true)
                }
                Key::Index(_) => Ok(false),
                key if key.is_length() => Err(ReactiveError::InvalidSequenceKey { key }),
                _ => Ok(false),
            },
        }
    }

    /// The existing keys, subscribing the active reaction to the key set.
    ///
    /// Records report keys in insertion order; sequences report the indices
    /// holding an element.
    pub fn keys(&self) -> Vec<Key> {
        let keys = match &self.inner.target {
            Target::Record(record) => record.keys(),
            Target::List(list) => list.indices().into_iter().map(Key::Index).collect(),
        };
        self.track(Dependency::Keys);
        keys
    }

    /// Call the method stored at `key` with this wrapper as its receiver.
    ///
    /// Methods read through a wrapper are actions, so the call is one batch.
    pub fn invoke(&self, key: impl Into<Key>, args: &[Value]) -> Result<Value> {
        let key = key.into();
        match self.read(&key)? {
            Value::Function(function) => function.call(&Value::Object(self.clone()), args),
            _ => Err(ReactiveError::NotCallable { key }),
        }
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    /// Number of reactions subscribed to the value of `key`.
    pub fn subscriber_count(&self, key: impl Into<Key>) -> usize {
        self.inner
            .registry
            .borrow()
            .dependents(&Dependency::Value(key.into()))
    }

    /// Number of dependency edges pointing at this wrapper.
    pub fn dependency_count(&self) -> usize {
        self.inner.registry.borrow().edge_count()
    }

    /// Whether a value for `key` is cached.
    pub fn is_cached(&self, key: impl Into<Key>) -> bool {
        self.inner.cache.borrow().contains(&key.into())
    }

    pub(crate) fn identity(&self) -> *const () {
        match &self.inner.target {
            Target::Record(record) => record.identity(),
            Target::List(list) => list.identity(),
        }
    }

    pub(crate) fn display_raw(&self) -> String {
        match &self.inner.target {
            Target::Record(_) => "[object Object]".to_string(),
            Target::List(list) => Value::List(list.clone()).to_display_string(),
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn track(&self, dependency: Dependency) {
        if let Some(reaction) = ReactiveContext::current() {
            if !reaction.is_stopped() {
                graph::track(&self.inner.registry, dependency, &reaction);
            }
        }
    }

    /// Value of `key` as the raw target reports it. Getters run here, with
    /// this wrapper as receiver.
    fn raw_get(&self, key: &Key) -> Result<Value> {
        match &self.inner.target {
            Target::Record(record) => match record.property(key) {
                None => Ok(Value::Undefined),
                Some(Property::Data(value)) => Ok(value),
                Some(Property::Accessor { get: Some(get), .. }) => get(self),
                Some(Property::Accessor { get: None, .. }) => Ok(Value::Undefined),
            },
            Target::List(list) => Ok(match key {
                Key::Index(index) => list.get(*index),
                key if key.is_length() => Value::from(list.len()),
                _ => Value::Undefined,
            }),
        }
    }

    /// Turn a raw value into what reads hand out.
    fn adopt(&self, raw: Value) -> Value {
        match raw {
            Value::Record(record) => {
                Value::Object(Observable::for_record(&record, Rc::clone(&self.inner.plugin)))
            }
            value @ (Value::List(_) | Value::Foreign(_)) => {
                self.inner.plugin.wrap(value, &self.inner.plugin)
            }
            Value::Function(function) => Value::Function(function.into_action()),
            other => other,
        }
    }

    fn compute(&self, key: &Key) -> Result<Value> {
        let weak = Rc::downgrade(&self.inner);
        let slot = key.clone();
        let computation = Reaction::computation(move |stop| match weak.upgrade() {
            Some(inner) => Observable { inner }.refresh(&slot, stop.id()),
            None => {
                stop.stop();
                Ok(())
            }
        });

        let raw = match computation.track(|| self.raw_get(key)) {
            Ok(raw) => raw,
            Err(err) => {
                computation.stop();
                return Err(err);
            }
        };
        let value = self.adopt(raw);

        let computation = if computation.dependency_count() > 0 {
            Some(computation)
        } else {
            computation.stop();
            None
        };
        let displaced = self
            .inner
            .cache
            .borrow_mut()
            .insert(key.clone(), value.clone(), computation);
        if let Some(displaced) = displaced {
            displaced.stop();
        }
        Ok(value)
    }

    /// Recompute the entry for `key` from inside its computation.
    fn refresh(&self, key: &Key, computation: ReactionId) -> Result<()> {
        if self.inner.cache.borrow().computation(key) != Some(computation) {
            return Ok(());
        }
        match self.raw_get(key) {
            Ok(raw) => {
                let value = self.adopt(raw);
                let changed = self.inner.cache.borrow_mut().refresh(key, value);
                if changed {
                    tracing::trace!(key = %key, "cached value refreshed");
                    self.notify(Dependency::Value(key.clone()))
                } else {
                    Ok(())
                }
            }
            Err(err) => {
                tracing::debug!(key = %key, error = %err, "computation failed, dropping cached value");
                self.invalidate(key);
                self.notify(Dependency::Value(key.clone()))
            }
        }
    }

    /// Drop the cache entry for `key` and stop its computation.
    fn invalidate(&self, key: &Key) {
        let computation = self.inner.cache.borrow_mut().remove(key);
        if let Some(computation) = computation {
            computation.stop();
        }
    }

    /// Empty the slot and rerun what it held. Computations refresh at once;
    /// reactions are scheduled.
    fn notify(&self, dependency: Dependency) -> Result<()> {
        let taken = self.inner.registry.borrow_mut().take(&dependency);
        if taken.is_empty() {
            return Ok(());
        }
        tracing::trace!(dependency = %dependency, count = taken.len(), "notifying dependents");

        let (computations, reactions): (Vec<_>, Vec<_>) =
            taken.into_iter().partition(Reaction::is_computation);
        let mut outcome = Ok(());
        for computation in computations {
            if let Err(err) = computation.run() {
                if outcome.is_ok() {
                    outcome = Err(err);
                }
            }
        }
        let scheduled = Runtime::schedule_all(reactions);
        outcome.and(scheduled)
    }

    fn notify_all(&self, dependencies: impl IntoIterator<Item = Dependency>) -> Result<()> {
        let mut outcome = Ok(());
        for dependency in dependencies {
            if let Err(err) = self.notify(dependency) {
                if outcome.is_ok() {
                    outcome = Err(err);
                }
            }
        }
        outcome
    }

    /// The value a write compares against: cached if present, raw otherwise.
    fn cached_or(&self, key: &Key, raw: Value) -> Value {
        self.inner.cache.borrow().get(key).unwrap_or(raw)
    }

    /// Invalidate and notify after `key` was removed from the target.
    fn removed(&self, key: Key, changed: bool) -> Result<()> {
        self.invalidate(&key);
        let mut slots = Vec::with_capacity(3);
        if changed {
            slots.push(Dependency::Value(key.clone()));
        }
        slots.push(Dependency::Presence(key));
        slots.push(Dependency::Keys);
        self.notify_all(slots)
    }

    fn write_field(&self, record: &Record, key: Key, value: Value) -> Result<()> {
        let existed = record.contains_key(&key);
        let previous = self.cached_or(&key, record.get(&key).unwrap_or_default());
        let changed = !previous.same(&value);
        if existed && !changed {
            return Ok(());
        }

        Runtime::batch(|| {
            if changed {
                self.invalidate(&key);
            }
            record.insert(key.clone(), value);

            let mut slots = Vec::with_capacity(3);
            if changed {
                slots.push(Dependency::Value(key.clone()));
            }
            if !existed {
                slots.push(Dependency::Presence(key));
                slots.push(Dependency::Keys);
            }
            self.notify_all(slots)
        })
    }

    fn write_accessor(
        &self,
        key: Key,
        set: Option<crate::value::Setter>,
        value: Value,
    ) -> Result<()> {
        let Some(set) = set else {
            return Err(ReactiveError::ReadOnly { key });
        };
        let cached = self.inner.cache.borrow().get(&key);
        if cached.is_some_and(|cached| cached.same(&value)) {
            return Ok(());
        }

        Runtime::batch(|| {
            set(self, value)?;
            // An entry with no computation cannot refresh itself.
            let stale = {
                let cache = self.inner.cache.borrow();
                cache.contains(&key) && cache.computation(&key).is_none()
            };
            if stale {
                self.invalidate(&key);
                self.notify(Dependency::Value(key))
            } else {
                Ok(())
            }
        })
    }

    fn write_index(&self, list: &List, index: usize, value: Value) -> Result<()> {
        let key = Key::Index(index);
        let existed = list.contains_index(index);
        let previous = self.cached_or(&key, list.get(index));
        let changed = !previous.same(&value);
        if existed && !changed {
            return Ok(());
        }

        Runtime::batch(|| {
            let grows = index >= list.len();
            if changed {
                self.invalidate(&key);
            }
            list.set(index, value);

            let mut slots = Vec::with_capacity(4);
            if changed {
                slots.push(Dependency::Value(key.clone()));
            }
            if !existed {
                slots.push(Dependency::Presence(key));
                slots.push(Dependency::Keys);
            }
            if grows {
                self.invalidate(&Key::length());
                slots.push(Dependency::Value(Key::length()));
            }
            self.notify_all(slots)
        })
    }

    fn write_length(&self, list: &List, value: Value) -> Result<()> {
        let len = match value {
            Value::Number(n) if n >= 0.0 && n.fract() == 0.0 && n <= List::MAX_LEN as f64 => {
                n as usize
            }
            other => {
                return Err(ReactiveError::InvalidLength {
                    value: other.to_display_string(),
                })
            }
        };
        self.resize(list, len)
    }

    /// Set the length of the sequence, notifying every element that went
    /// away. Holes past the new end notify nothing.
    pub(crate) fn resize(&self, list: &List, len: usize) -> Result<()> {
        if len > List::MAX_LEN {
            return Err(ReactiveError::InvalidLength {
                value: len.to_string(),
            });
        }
        let old = list.len();
        if old == len {
            return Ok(());
        }

        Runtime::batch(|| {
            let removed: Vec<(usize, bool)> = list
                .indices_from(len)
                .into_iter()
                .map(|index| {
                    let defined = !self
                        .cached_or(&Key::Index(index), list.get(index))
                        .is_undefined();
                    (index, defined)
                })
                .collect();
            list.set_len(len);

            self.invalidate(&Key::length());
            let mut slots = vec![Dependency::Value(Key::length())];
            for (index, defined) in &removed {
                let key = Key::Index(*index);
                self.invalidate(&key);
                if *defined {
                    slots.push(Dependency::Value(key.clone()));
                }
                slots.push(Dependency::Presence(key));
            }
            if !removed.is_empty() {
                slots.push(Dependency::Keys);
            }
            self.notify_all(slots)
        })
    }

    /// The raw sequence, or an error for records.
    pub(crate) fn list(&self) -> Result<&List> {
        match &self.inner.target {
            Target::List(list) => Ok(list),
            Target::Record(_) => Err(ReactiveError::NotASequence),
        }
    }
}

impl PropertyAccess for Observable {
    fn read(&self, key: Key) -> Result<Value> {
        Observable::read(self, key)
    }

    fn write(&self, key: Key, value: Value) -> Result<()> {
        Observable::write(self, key, value)
    }

    fn has(&self, key: Key) -> bool {
        Observable::has(self, key)
    }

    fn delete_key(&self, key: Key) -> Result<bool> {
        Observable::delete_key(self, key)
    }

    fn keys(&self) -> Vec<Key> {
        Observable::keys(self)
    }
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("target", &self.inner.target)
            .field("cached", &self.inner.cache.try_borrow().map(|c| c.len()).ok())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::reactive::observe;

    fn counted(observable: &Observable, key: &'static str) -> (Rc<Cell<usize>>, crate::Stop) {
        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let observable = observable.clone();
        let stop = observe(move |_| {
            runs_clone.set(runs_clone.get() + 1);
            observable.read(key)?;
            Ok(())
        })
        .unwrap();
        (runs, stop)
    }

    fn record(record: Record) -> Observable {
        Observable::for_record(&record, Rc::new(DefaultPlugin))
    }

    #[test]
    fn wrapping_is_canonical() {
        let raw = Record::new();
        let a = record(raw.clone());
        let b = record(raw.clone());
        assert!(a.ptr_eq(&b));
        assert_eq!(Value::from(a), Value::from(raw));
    }

    #[test]
    fn wrap_passes_non_objects_through() {
        assert_eq!(wrap(1), Value::from(1));
        assert!(wrap(Value::Null).is_nullish());

        let wrapped = wrap(Record::new());
        let again = wrap(wrapped.clone());
        assert!(wrapped.as_observable().unwrap().ptr_eq(again.as_observable().unwrap()));
    }

    #[test]
    fn nested_records_come_back_wrapped_once() {
        let inner = Record::new().with("x", 1);
        let outer = record(Record::new().with("inner", inner.clone()));

        let first = outer.read("inner").unwrap();
        let second = outer.read("inner").unwrap();
        let first = first.as_observable().unwrap();
        assert!(first.ptr_eq(second.as_observable().unwrap()));
        assert!(first.ptr_eq(&record(inner)));
    }

    #[test]
    fn write_same_value_does_not_notify() {
        let state = record(Record::new().with("a", 1));
        let (runs, _stop) = counted(&state, "a");

        state.write("a", 1).unwrap();
        assert_eq!(runs.get(), 1);

        state.write("a", 2).unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn read_populates_cache_and_write_clears_it() {
        let state = record(Record::new().with("a", 1));
        state.read("a").unwrap();
        assert!(state.is_cached("a"));

        state.write("a", 2).unwrap();
        assert!(!state.is_cached("a"));
        assert_eq!(state.read("a").unwrap(), Value::from(2));
    }

    #[test]
    fn untracked_reads_do_not_subscribe() {
        let state = record(Record::new().with("a", 1));
        let runs = Rc::new(Cell::new(0));
        let (runs_clone, state_clone) = (runs.clone(), state.clone());
        let _stop = observe(move |_| {
            runs_clone.set(runs_clone.get() + 1);
            crate::untracked(|| state_clone.read("a"))?;
            Ok(())
        })
        .unwrap();

        state.write("a", 2).unwrap();
        assert_eq!(runs.get(), 1);
        assert_eq!(state.subscriber_count("a"), 0);
    }

    #[test]
    fn stop_releases_subscriptions() {
        let state = record(Record::new().with("a", 1));
        let (_runs, stop) = counted(&state, "a");
        assert_eq!(state.subscriber_count("a"), 1);

        stop.stop();
        assert_eq!(state.dependency_count(), 0);
    }

    #[test]
    fn stopping_releases_a_captured_wrapper() {
        let state = record(Record::new().with("a", 1));
        let weak = Rc::downgrade(&state.inner);
        let (_runs, stop) = counted(&state, "a");

        drop(state);
        assert!(weak.upgrade().is_some());

        stop.stop();
        drop(stop);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn accessor_without_setter_is_read_only() {
        let state = record(Record::new().with_getter("two", |_| Ok(Value::from(2))));
        let err = state.write("two", 3).unwrap_err();
        assert!(matches!(err, ReactiveError::ReadOnly { .. }));
        assert_eq!(state.read("two").unwrap(), Value::from(2));
    }

    #[test]
    fn getter_without_tracked_reads_keeps_no_computation() {
        let state = record(Record::new().with_getter("two", |_| Ok(Value::from(2))));
        state.read("two").unwrap();
        assert!(state.is_cached("two"));
        assert_eq!(state.inner.cache.borrow().computation(&Key::from("two")), None);
    }

    #[test]
    fn failing_getter_leaves_no_cache_entry() {
        let attempts = Rc::new(Cell::new(0));
        let attempts_clone = attempts.clone();
        let state = record(Record::new().with_getter("flaky", move |_| {
            attempts_clone.set(attempts_clone.get() + 1);
            if attempts_clone.get() == 1 {
                Err(ReactiveError::failed("not yet"))
            } else {
                Ok(Value::from("ok"))
            }
        }));

        assert!(state.read("flaky").is_err());
        assert!(!state.is_cached("flaky"));
        assert_eq!(state.read("flaky").unwrap(), Value::from("ok"));
    }

    #[test]
    fn list_rejects_named_keys() {
        let list = Observable::for_list(&List::from_iter([1]), Rc::new(DefaultPlugin));
        let err = list.write("name", 1).unwrap_err();
        assert!(matches!(err, ReactiveError::InvalidSequenceKey { .. }));

        let err = list.write("length", -1).unwrap_err();
        assert!(matches!(err, ReactiveError::InvalidLength { .. }));
    }

    #[test]
    fn lengths_and_indices_are_bounded() {
        let list = Observable::for_list(&List::new(), Rc::new(DefaultPlugin));

        let err = list.write("length", 1e18).unwrap_err();
        assert!(matches!(err, ReactiveError::InvalidLength { .. }));
        let err = list.set_len(List::MAX_LEN + 1).unwrap_err();
        assert!(matches!(err, ReactiveError::InvalidLength { .. }));

        let err = list.write(usize::MAX, 1).unwrap_err();
        assert!(matches!(err, ReactiveError::InvalidSequenceKey { .. }));
        let err = list.write(List::MAX_LEN, 1).unwrap_err();
        assert!(matches!(err, ReactiveError::InvalidSequenceKey { .. }));
        assert_eq!(list.len().unwrap(), 0);

        list.write(List::MAX_LEN - 1, "last").unwrap();
        assert_eq!(list.len().unwrap(), List::MAX_LEN);
        assert_eq!(list.keys(), vec![Key::Index(List::MAX_LEN - 1)]);
    }

    #[test]
    fn truncating_a_huge_sparse_list_notifies_its_elements() {
        let raw = List::from_iter([1]);
        raw.set_len(List::MAX_LEN);
        let list = Observable::for_list(&raw, Rc::new(DefaultPlugin));
        let (first_runs, _first) = counted(&list, "0");

        list.write("length", 0).unwrap();
        assert_eq!(first_runs.get(), 2);
        assert_eq!(list.len().unwrap(), 0);
    }

    #[test]
    fn invoke_requires_function() {
        let state = record(Record::new().with("a", 1));
        let err = state.invoke("a", &[]).unwrap_err();
        assert!(matches!(err, ReactiveError::NotCallable { .. }));
    }
}
