//! Mazzard Core
//!
//! This crate provides a fine-grained reactive dependency-tracking engine.
//! Plain records and sequences are wrapped so that reads establish
//! dependency edges and writes re-run exactly the computations that depend
//! on the data that changed.
//!
//! It implements:
//!
//! - Wrapping of plain data, nested values included, at most once per value
//! - Per-key value caching with computed getters that refresh themselves
//! - Reactions that re-run when what they read changes
//! - Actions that batch writes so each reaction runs once per batch
//! - Tracked sequence operations, including `length` invalidation
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value`: The dynamic data model (values, keys, records, sequences)
//! - `observable`: Wrappers, plugins and sequence operations
//! - `graph`: Per-wrapper dependency registry and value cache
//! - `reactive`: Reactions, the active-reaction context, batching
//! - `config`: Per-thread engine configuration
//! - `error`: The shared error type
//!
//! # Example
//!
//! ```rust,ignore
//! use mazzard_core::{observe, wrap, Record, Value};
//!
//! let state = wrap(Record::new());
//! let state = state.as_observable().unwrap().clone();
//!
//! let reader = state.clone();
//! let stop = observe(move |_| {
//!     println!("x = {:?}", reader.read("x")?);
//!     Ok(())
//! })?;
//!
//! state.write("x", 1)?; // prints "x = Number(1)"
//! state.write("x", 1)?; // same value, nothing runs
//! stop.stop();
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod observable;
pub mod reactive;
pub mod value;

pub use config::Config;
pub use error::{ReactiveError, Result};
pub use observable::{
    wrap, wrap_with, DefaultPlugin, NoPlugin, Observable, Plugin, PropertyAccess, Target,
};
pub use reactive::{action, observe, untracked, Reaction, ReactionId, Runtime, Stop};
pub use value::{Foreign, Function, Key, List, Property, Record, Value};

/// Check whether `value` is already tracked.
pub fn is_wrapped(value: &Value) -> bool {
    matches!(value, Value::Object(_))
}
