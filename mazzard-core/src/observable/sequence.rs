//! Sequence Operations
//!
//! Tracked operations on wrapped sequences. Every operation goes through the
//! property traps, so it subscribes to exactly the indices and `length` it
//! reads. Operations that write do so inside one batch.
//!
//! Mutators that only need the length to know where to write (`push`, `pop`)
//! read it untracked, so a reaction pushing onto a sequence does not
//! re-trigger itself.
//!
//! All of them fail with [`ReactiveError::NotASequence`] on a wrapped record.

use std::ops::{Bound, RangeBounds};

use super::{Observable, PropertyAccess};
use crate::error::{ReactiveError, Result};
use crate::reactive::Runtime;
use crate::value::{Key, List, Value};

impl Observable {
    /// The tracked `length`.
    pub fn len(&self) -> Result<usize> {
        self.list()?;
        match PropertyAccess::read(self, Key::length())? {
            Value::Number(n) => Ok(n as usize),
            other => Err(ReactiveError::InvalidLength {
                value: other.to_display_string(),
            }),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, index: usize) -> Result<Value> {
        self.list()?;
        self.read(index)
    }

    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        self.list()?;
        self.write(index, value)
    }

    /// Append `value`. Returns the new length.
    pub fn push(&self, value: impl Into<Value>) -> Result<usize> {
        let len = self.list()?.len();
        self.write(len, value)?;
        Ok(len + 1)
    }

    /// Remove and return the last element; undefined when empty.
    pub fn pop(&self) -> Result<Value> {
        let list = self.list()?;
        let Some(last) = list.len().checked_sub(1) else {
            return Ok(Value::Undefined);
        };
        Runtime::batch(|| {
            let value = crate::untracked(|| self.read(last))?;
            self.resize(list, last)?;
            Ok(value)
        })
    }

    /// Truncate, or grow with holes.
    pub fn set_len(&self, len: usize) -> Result<()> {
        let list = self.list()?;
        self.resize(list, len)
    }

    /// Join the elements' display strings with `separator`.
    pub fn join(&self, separator: &str) -> Result<String> {
        let parts = self
            .to_vec()?
            .iter()
            .map(Value::to_display_string)
            .collect::<Vec<_>>();
        Ok(parts.join(separator))
    }

    /// Every element, holes as undefined.
    pub fn to_vec(&self) -> Result<Vec<Value>> {
        (0..self.len()?).map(|index| self.read(index)).collect()
    }

    pub fn entries(&self) -> Result<Vec<(usize, Value)>> {
        Ok(self.to_vec()?.into_iter().enumerate().collect())
    }

    pub fn for_each<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&Value, usize) -> Result<()>,
    {
        for index in 0..self.len()? {
            f(&self.read(index)?, index)?;
        }
        Ok(())
    }

    /// A new wrapped sequence holding `f` of every element.
    pub fn map<F>(&self, mut f: F) -> Result<Observable>
    where
        F: FnMut(&Value, usize) -> Result<Value>,
    {
        let mut mapped = Vec::new();
        for index in 0..self.len()? {
            mapped.push(f(&self.read(index)?, index)?);
        }
        Ok(self.derive(mapped))
    }

    /// A new wrapped sequence holding the elements `predicate` accepts.
    pub fn filter<F>(&self, mut predicate: F) -> Result<Observable>
    where
        F: FnMut(&Value, usize) -> Result<bool>,
    {
        let mut kept = Vec::new();
        for index in 0..self.len()? {
            let value = self.read(index)?;
            if predicate(&value, index)? {
                kept.push(value);
            }
        }
        Ok(self.derive(kept))
    }

    /// First element `predicate` accepts, or undefined.
    pub fn find<F>(&self, predicate: F) -> Result<Value>
    where
        F: FnMut(&Value, usize) -> Result<bool>,
    {
        Ok(match self.position(predicate)? {
            Some(index) => self.read(index)?,
            None => Value::Undefined,
        })
    }

    pub fn find_index<F>(&self, predicate: F) -> Result<Option<usize>>
    where
        F: FnMut(&Value, usize) -> Result<bool>,
    {
        self.position(predicate)
    }

    /// Index of the first element strictly equal to `needle`.
    pub fn index_of(&self, needle: &Value) -> Result<Option<usize>> {
        self.position(|value, _| Ok(value.same(needle)))
    }

    /// Like [`index_of`](Observable::index_of), but `NaN` finds `NaN`.
    pub fn includes(&self, needle: &Value) -> Result<bool> {
        let is_nan = |value: &Value| matches!(value, Value::Number(n) if n.is_nan());
        let found = self.position(|value, _| {
            Ok(value.same(needle) || (is_nan(value) && is_nan(needle)))
        })?;
        Ok(found.is_some())
    }

    pub fn every<F>(&self, mut predicate: F) -> Result<bool>
    where
        F: FnMut(&Value, usize) -> Result<bool>,
    {
        let failed = self.position(|value, index| Ok(!predicate(value, index)?))?;
        Ok(failed.is_none())
    }

    pub fn some<F>(&self, predicate: F) -> Result<bool>
    where
        F: FnMut(&Value, usize) -> Result<bool>,
    {
        Ok(self.position(predicate)?.is_some())
    }

    /// Write `value` to every index in `range`, clamped to the length.
    pub fn fill(&self, value: impl Into<Value>, range: impl RangeBounds<usize>) -> Result<()> {
        let value = value.into();
        let (start, end) = clamp(&range, self.len()?);
        Runtime::batch(|| {
            for index in start..end {
                self.write(index, value.clone())?;
            }
            Ok(())
        })
    }

    /// Copy the elements in `range` to the indices starting at `dest`,
    /// without growing the sequence.
    pub fn copy_within(&self, range: impl RangeBounds<usize>, dest: usize) -> Result<()> {
        let len = self.len()?;
        let (start, end) = clamp(&range, len);
        let count = (end - start).min(len.saturating_sub(dest));
        let values = (start..start + count)
            .map(|index| self.read(index))
            .collect::<Result<Vec<_>>>()?;
        Runtime::batch(|| {
            for (offset, value) in values.into_iter().enumerate() {
                self.write(dest + offset, value)?;
            }
            Ok(())
        })
    }

    /// A new wrapped sequence: these elements followed by each of `others`.
    /// Sequences among `others` are spread, anything else is appended as is.
    pub fn concat(&self, others: &[Value]) -> Result<Observable> {
        let mut joined = self.to_vec()?;
        for other in others {
            match other {
                Value::Object(observable) if observable.is_sequence() => {
                    joined.extend(observable.to_vec()?);
                }
                Value::List(list) => joined.extend(list.values()),
                value => joined.push(value.clone()),
            }
        }
        Ok(self.derive(joined))
    }

    fn position<F>(&self, mut predicate: F) -> Result<Option<usize>>
    where
        F: FnMut(&Value, usize) -> Result<bool>,
    {
        for index in 0..self.len()? {
            if predicate(&self.read(index)?, index)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Wrap a freshly built sequence with this wrapper's plugin.
    fn derive(&self, values: Vec<Value>) -> Observable {
        Observable::for_list(&List::from(values), std::rc::Rc::clone(self.plugin()))
    }
}

fn clamp(range: &impl RangeBounds<usize>, len: usize) -> (usize, usize) {
    let start = match range.start_bound() {
        Bound::Included(&n) => n,
        Bound::Excluded(&n) => n.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&n) => n.saturating_add(1),
        Bound::Excluded(&n) => n,
        Bound::Unbounded => len,
    };
    let end = end.min(len);
    (start.min(end), end)
}
