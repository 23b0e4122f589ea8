//! Reactive Primitives
//!
//! This module implements reactions, the active-reaction context, and the
//! batch coordinator. Together with the wrappers in [`crate::observable`]
//! they form the dependency-tracking engine.
//!
//! # Concepts
//!
//! ## Reactions
//!
//! A Reaction is a re-runnable computation. While it runs it is the active
//! reaction, and every wrapped key it reads records it as a dependent. When
//! such a key is written, the reaction runs again.
//!
//! ## Batches and actions
//!
//! A batch defers reaction runs until it finishes, so a reaction depending
//! on several keys written together runs once and sees the final state. An
//! action is a function whose every call is a batch. Every single write is
//! an implicit batch of its own.
//!
//! # Implementation Notes
//!
//! The active reaction and the batch state are thread-local. The engine is
//! strictly synchronous and single-threaded: nothing is ever deferred past
//! the call that caused it.

mod context;
mod reaction;
mod runtime;

pub use context::{untracked, ReactiveContext};
pub use reaction::{observe, Reaction, ReactionId, Stop};
pub use runtime::{action, Runtime};
