//! Plain sequences.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use super::{Value, Visit, WrapperSlot};

pub(crate) struct ListData {
    /// Elements by index. An index below `len` with no entry is a hole: it
    /// reads as undefined but does not exist as a key.
    pub(crate) items: RefCell<BTreeMap<usize, Value>>,
    pub(crate) len: Cell<usize>,
    pub(crate) wrapper: WrapperSlot,
}

/// A shared plain sequence.
///
/// Cloning a `List` clones the handle. All methods here are raw: they neither
/// track nor notify. Holes cost nothing, so growing the length is free.
#[derive(Clone)]
pub struct List(pub(crate) Rc<ListData>);

impl List {
    /// Largest length a sequence may have. The largest index is one less.
    pub const MAX_LEN: usize = u32::MAX as usize;

    pub fn new() -> Self {
        Self::from_items(BTreeMap::new(), 0)
    }

    fn from_items(items: BTreeMap<usize, Value>, len: usize) -> Self {
        Self(Rc::new(ListData {
            items: RefCell::new(items),
            len: Cell::new(len),
            wrapper: RefCell::new(Weak::new()),
        }))
    }

    pub fn len(&self) -> usize {
        self.0.len.get()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`; holes and out-of-range indices are undefined.
    pub fn get(&self, index: usize) -> Value {
        self.0.items.borrow().get(&index).cloned().unwrap_or_default()
    }

    /// Whether `index` holds an element (holes do not).
    pub fn contains_index(&self, index: usize) -> bool {
        self.0.items.borrow().contains_key(&index)
    }

    /// Store `value` at `index`, growing the list with holes if needed.
    pub fn set(&self, index: usize, value: impl Into<Value>) {
        self.0.items.borrow_mut().insert(index, value.into());
        if index >= self.len() {
            self.0.len.set(index.saturating_add(1));
        }
    }

    pub fn push(&self, value: impl Into<Value>) -> usize {
        self.set(self.len(), value);
        self.len()
    }

    /// Truncate, or grow with holes.
    pub fn set_len(&self, len: usize) {
        if len < self.len() {
            self.0.items.borrow_mut().split_off(&len);
        }
        self.0.len.set(len);
    }

    /// Punch a hole at `index`. Returns whether an element was removed.
    pub fn delete(&self, index: usize) -> bool {
        self.0.items.borrow_mut().remove(&index).is_some()
    }

    /// Indices that hold an element.
    pub fn indices(&self) -> Vec<usize> {
        self.indices_from(0)
    }

    /// Indices at or past `start` that hold an element.
    pub fn indices_from(&self, start: usize) -> Vec<usize> {
        self.0.items.borrow().range(start..).map(|(index, _)| *index).collect()
    }

    /// All elements, holes as undefined.
    pub fn values(&self) -> Vec<Value> {
        (0..self.len()).map(|index| self.get(index)).collect()
    }

    pub fn ptr_eq(&self, other: &List) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn identity(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Into<Value>> FromIterator<V> for List {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let items: BTreeMap<usize, Value> = iter
            .into_iter()
            .enumerate()
            .map(|(index, value)| (index, value.into()))
            .collect();
        let len = items.len();
        Self::from_items(items, len)
    }
}

impl From<Vec<Value>> for List {
    fn from(values: Vec<Value>) -> Self {
        values.into_iter().collect()
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(_visit) = Visit::enter(self.identity()) else {
            return f.write_str("[<cycle>]");
        };
        match self.0.items.try_borrow() {
            Ok(items) => f.debug_map().entries(items.iter()).finish(),
            Err(_) => f.write_str("List(<borrowed>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_past_end_leaves_holes() {
        let list = List::new();
        list.set(2, "c");
        assert_eq!(list.len(), 3);
        assert!(!list.contains_index(0));
        assert!(list.contains_index(2));
        assert_eq!(list.get(0), Value::Undefined);
        assert_eq!(list.indices(), vec![2]);
    }

    #[test]
    fn delete_punches_hole_without_shrinking() {
        let list: List = [1, 2, 3].into_iter().collect();
        assert!(list.delete(1));
        assert!(!list.delete(1));
        assert!(!list.delete(10));
        assert_eq!(list.len(), 3);
        assert_eq!(list.values(), vec![Value::from(1), Value::Undefined, Value::from(3)]);
    }

    #[test]
    fn set_len_truncates_and_grows() {
        let list: List = [1, 2, 3].into_iter().collect();
        list.set_len(1);
        assert_eq!(list.values(), vec![Value::from(1)]);
        list.set_len(2);
        assert_eq!(list.len(), 2);
        assert!(!list.contains_index(1));
    }

    #[test]
    fn growing_to_the_maximum_stores_nothing() {
        let list: List = [1].into_iter().collect();
        list.set_len(List::MAX_LEN);
        assert_eq!(list.len(), List::MAX_LEN);
        assert_eq!(list.indices(), vec![0]);
        assert_eq!(list.get(List::MAX_LEN - 1), Value::Undefined);

        list.set_len(0);
        assert!(list.is_empty());
        assert!(list.indices().is_empty());
    }

    #[test]
    fn indices_from_skips_holes() {
        let list = List::new();
        list.set(1, "b");
        list.set(5, "f");
        assert_eq!(list.indices_from(2), vec![5]);
        assert_eq!(list.indices_from(6), Vec::<usize>::new());
    }

    #[test]
    fn push_returns_new_length() {
        let list = List::new();
        assert_eq!(list.push(1), 1);
        assert_eq!(list.push(2), 2);
        assert_eq!(list.get(1), Value::from(2));
    }
}
