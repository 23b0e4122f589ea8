//! Wrapping plugins.
//!
//! The core only wraps plain records. Everything else that is an object
//! (sequences, foreign host objects) is handed to a plugin, which decides
//! whether and how to track it.

use std::rc::Rc;

use super::Observable;
use crate::value::Value;

/// Extension point for wrapping non-record objects.
pub trait Plugin {
    /// Wrap `value` or return it unchanged.
    ///
    /// `inherited` is the plugin the resulting wrapper should pass on to the
    /// values nested inside it; normally the plugin being called.
    fn wrap(&self, value: Value, inherited: &Rc<dyn Plugin>) -> Value;
}

/// Tracks sequences; leaves foreign objects alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPlugin;

impl Plugin for DefaultPlugin {
    fn wrap(&self, value: Value, inherited: &Rc<dyn Plugin>) -> Value {
        match value {
            Value::List(list) => Value::Object(Observable::for_list(&list, Rc::clone(inherited))),
            other => other,
        }
    }
}

/// Wraps nothing but plain records.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPlugin;

impl Plugin for NoPlugin {
    fn wrap(&self, value: Value, _inherited: &Rc<dyn Plugin>) -> Value {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Foreign, List};

    #[test]
    fn default_plugin_wraps_lists_only() {
        let plugin: Rc<dyn Plugin> = Rc::new(DefaultPlugin);

        let wrapped = plugin.wrap(Value::from(List::from_iter([1, 2])), &plugin);
        assert!(wrapped.as_observable().is_some_and(Observable::is_sequence));

        let foreign = Value::from(Foreign::new(5_u8));
        assert!(matches!(plugin.wrap(foreign, &plugin), Value::Foreign(_)));
    }

    #[test]
    fn no_plugin_passes_through() {
        let plugin: Rc<dyn Plugin> = Rc::new(NoPlugin);
        let list = List::from_iter([1]);
        let value = plugin.wrap(Value::from(list.clone()), &plugin);
        assert!(matches!(value, Value::List(ref l) if l.ptr_eq(&list)));
    }
}
