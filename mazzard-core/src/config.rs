//! Engine Configuration
//!
//! The engine has very little to configure. The only runtime knob is the
//! re-entry limit for reaction runs: a reaction that keeps re-triggering
//! itself synchronously (for example by incrementing a property it reads)
//! would otherwise recurse until the stack overflows. When one reaction is
//! nested inside itself that many times, the next run fails with
//! [`ReactiveError::RecursionLimit`]. Chains of different reactions are not
//! limited.
//!
//! Configuration is per thread, like the rest of the engine state.
//!
//! [`ReactiveError::RecursionLimit`]: crate::ReactiveError::RecursionLimit

use std::cell::RefCell;

/// Environment variable read by [`Config::from_env`].
pub const MAX_REACTION_DEPTH_ENV: &str = "MAZZARD_MAX_REACTION_DEPTH";

const DEFAULT_MAX_REACTION_DEPTH: usize = 100;

thread_local! {
    static CONFIG: RefCell<Config> = RefCell::new(Config::default());
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How many runs of the same reaction may be nested inside each other
    /// before the next one is refused.
    pub max_reaction_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_reaction_depth: DEFAULT_MAX_REACTION_DEPTH,
        }
    }
}

impl Config {
    /// Defaults, overridden by `MAZZARD_MAX_REACTION_DEPTH` when it holds a
    /// positive integer. Unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(MAX_REACTION_DEPTH_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_reaction_depth = depth,
                _ => tracing::debug!(value = %raw, "ignoring invalid {}", MAX_REACTION_DEPTH_ENV),
            }
        }
        config
    }

    #[must_use]
    pub fn with_max_reaction_depth(mut self, depth: usize) -> Self {
        self.max_reaction_depth = depth.max(1);
        self
    }

    /// Make this the configuration of the current thread.
    pub fn install(self) {
        CONFIG.with(|config| *config.borrow_mut() = self);
    }

    /// The configuration of the current thread.
    pub fn current() -> Self {
        CONFIG.with(|config| config.borrow().clone())
    }

    pub(crate) fn max_depth() -> usize {
        CONFIG.with(|config| config.borrow().max_reaction_depth)
    }
}
