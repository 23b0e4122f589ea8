//! Plain records.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::{Function, Key, Value, Visit, WrapperSlot};
use crate::error::Result;
use crate::observable::Observable;

/// Computes an accessor's value. The receiver is the wrapper being read.
pub type Getter = Rc<dyn Fn(&Observable) -> Result<Value>>;

/// Handles a write to an accessor. The receiver is the wrapper being written.
pub type Setter = Rc<dyn Fn(&Observable, Value) -> Result<()>>;

/// One property slot of a record.
#[derive(Clone)]
pub enum Property {
    Data(Value),
    Accessor {
        get: Option<Getter>,
        set: Option<Setter>,
    },
}

impl Property {
    pub fn is_accessor(&self) -> bool {
        matches!(self, Property::Accessor { .. })
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Data(value) => f.debug_tuple("Data").field(value).finish(),
            Property::Accessor { get, set } => f
                .debug_struct("Accessor")
                .field("get", &get.is_some())
                .field("set", &set.is_some())
                .finish(),
        }
    }
}

pub(crate) struct RecordData {
    pub(crate) properties: RefCell<IndexMap<Key, Property>>,
    pub(crate) wrapper: WrapperSlot,
}

/// A shared plain record.
///
/// Cloning a `Record` clones the handle, not the properties. Properties keep
/// insertion order, which is the order [`keys`](Record::keys) reports.
#[derive(Clone)]
pub struct Record(pub(crate) Rc<RecordData>);

impl Record {
    pub fn new() -> Self {
        Self(Rc::new(RecordData {
            properties: RefCell::new(IndexMap::new()),
            wrapper: RefCell::new(Weak::new()),
        }))
    }

    /// Builder form of [`insert`](Record::insert).
    #[must_use]
    pub fn with(self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add a computed property.
    #[must_use]
    pub fn with_getter<G>(self, key: impl Into<Key>, get: G) -> Self
    where
        G: Fn(&Observable) -> Result<Value> + 'static,
    {
        self.define(
            key,
            Property::Accessor {
                get: Some(Rc::new(get)),
                set: None,
            },
        );
        self
    }

    /// Add a computed property with a setter.
    #[must_use]
    pub fn with_accessor<G, S>(self, key: impl Into<Key>, get: G, set: S) -> Self
    where
        G: Fn(&Observable) -> Result<Value> + 'static,
        S: Fn(&Observable, Value) -> Result<()> + 'static,
    {
        self.define(
            key,
            Property::Accessor {
                get: Some(Rc::new(get)),
                set: Some(Rc::new(set)),
            },
        );
        self
    }

    /// Add a method. The receiver handed to it is the value it was invoked on.
    #[must_use]
    pub fn with_method<F>(self, key: impl Into<Key>, method: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + 'static,
    {
        self.insert(key, Function::new(method));
        self
    }

    /// Raw write. Not tracked: go through the wrapper to notify reactions.
    pub fn insert(&self, key: impl Into<Key>, value: impl Into<Value>) {
        self.define(key, Property::Data(value.into()));
    }

    /// Raw property definition, replacing whatever the slot held.
    pub fn define(&self, key: impl Into<Key>, property: Property) {
        self.0
            .properties
            .borrow_mut()
            .insert(key.into(), property);
    }

    /// Raw removal, keeping the order of the remaining keys.
    pub fn remove(&self, key: &Key) -> Option<Property> {
        self.0.properties.borrow_mut().shift_remove(key)
    }

    pub fn property(&self, key: &Key) -> Option<Property> {
        self.0.properties.borrow().get(key).cloned()
    }

    /// Raw data value of `key`. Accessors and missing keys yield `None`.
    pub fn get(&self, key: &Key) -> Option<Value> {
        match self.0.properties.borrow().get(key) {
            Some(Property::Data(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.0.properties.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<Key> {
        self.0.properties.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.properties.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ptr_eq(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn identity(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(_visit) = Visit::enter(self.identity()) else {
            return f.write_str("{<cycle>}");
        };
        // try_borrow: a getter may be printing the record it belongs to.
        match self.0.properties.try_borrow() {
            Ok(properties) => f.debug_map().entries(properties.iter()).finish(),
            Err(_) => f.write_str("Record(<borrowed>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let record = Record::new().with("a", 1).with("b", "two");
        assert_eq!(record.len(), 2);
        assert_eq!(record.get(&Key::from("a")), Some(Value::from(1)));
        assert!(record.contains_key(&Key::from("b")));

        assert!(record.remove(&Key::from("a")).is_some());
        assert!(record.remove(&Key::from("a")).is_none());
        assert_eq!(record.keys(), vec![Key::from("b")]);
    }

    #[test]
    fn keys_keep_insertion_order() {
        let record = Record::new().with("z", 1).with("a", 2).with("m", 3);
        record.remove(&Key::from("a"));
        record.insert("b", 4);
        assert_eq!(
            record.keys(),
            vec![Key::from("z"), Key::from("m"), Key::from("b")]
        );
    }

    #[test]
    fn accessors_are_not_data() {
        let record = Record::new().with_getter("computed", |_| Ok(Value::from(1)));
        assert!(record.get(&Key::from("computed")).is_none());
        assert!(record
            .property(&Key::from("computed"))
            .is_some_and(|property| property.is_accessor()));
    }

    #[test]
    fn clones_share_properties() {
        let a = Record::new();
        let b = a.clone();
        a.insert("x", true);
        assert_eq!(b.get(&Key::from("x")), Some(Value::from(true)));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Record::new()));
    }
}
