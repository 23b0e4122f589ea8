//! Dynamic Values
//!
//! The engine tracks reads and writes on plain data. Rust has no transparent
//! property interception, so plain data is modelled explicitly here:
//!
//! - [`Value`] is the dynamic value type flowing through the engine.
//! - [`Record`] is a shared plain record (insertion-ordered properties, each a
//!   data value or a getter/setter pair).
//! - [`List`] is a shared plain sequence.
//! - [`Function`] is a callable taking a receiver and arguments.
//! - [`Foreign`] is any other host object. The core never wraps it; only a
//!   plugin may decide what to do with it.
//!
//! # Equality
//!
//! Equality is strict: primitives compare by value (`NaN` never equals
//! itself), everything else compares by identity. A wrapper and the raw value
//! it wraps share one identity, so writing an observable back into the slot
//! its raw value came from is not a change.

mod json;
mod list;
mod record;

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

pub use list::List;
pub use record::{Getter, Property, Record, Setter};

use crate::error::Result;
use crate::observable::{Inner as ObservableInner, Observable};
use crate::reactive::Runtime;

/// Back-pointer from a raw value to its wrapper, if one is alive.
///
/// This is the canonical registry guaranteeing a raw value is wrapped at
/// most once.
pub(crate) type WrapperSlot = RefCell<Weak<ObservableInner>>;

thread_local! {
    /// Containers being printed right now, innermost last.
    static PRINTING: RefCell<Vec<*const ()>> = RefCell::new(Vec::new());
}

/// Marks a record or sequence as being printed until dropped.
///
/// Entering fails when the container is already being printed further up,
/// which means it contains itself.
pub(crate) struct Visit;

impl Visit {
    pub(crate) fn enter(identity: *const ()) -> Option<Self> {
        PRINTING.with(|printing| {
            let mut printing = printing.borrow_mut();
            if printing.contains(&identity) {
                return None;
            }
            printing.push(identity);
            Some(Visit)
        })
    }
}

impl Drop for Visit {
    fn drop(&mut self) {
        PRINTING.with(|printing| {
            printing.borrow_mut().pop();
        });
    }
}

// ----------------------------------------------------------------------------
// Keys
// ----------------------------------------------------------------------------

/// A property key.
///
/// Textual keys spelling a canonical array index (`"0"`, `"42"`, but not
/// `"01"` or `"-1"`) normalize to [`Key::Index`], so `Key::from("3")` and
/// `Key::from(3)` are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Index(usize),
    Name(Rc<str>),
}

impl Key {
    /// The reserved `length` key of sequences.
    pub fn length() -> Self {
        Key::Name(Rc::from("length"))
    }

    pub fn is_length(&self) -> bool {
        matches!(self, Key::Name(name) if &**name == "length")
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(index) => Some(*index),
            Key::Name(_) => None,
        }
    }

    fn parse(text: &str) -> Self {
        let canonical = text == "0"
            || (!text.is_empty()
                && !text.starts_with('0')
                && text.bytes().all(|b| b.is_ascii_digit()));
        if canonical {
            if let Ok(index) = text.parse::<usize>() {
                return Key::Index(index);
            }
        }
        Key::Name(Rc::from(text))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(index) => write!(f, "{index}"),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Key {
    fn from(text: &str) -> Self {
        Key::parse(text)
    }
}

impl From<String> for Key {
    fn from(text: String) -> Self {
        Key::parse(&text)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value>;

/// A callable value.
///
/// The first argument is the receiver (`this`): when a method is invoked
/// through a wrapper, the receiver is the wrapper itself so everything the
/// method reads or writes is tracked.
#[derive(Clone)]
pub struct Function {
    callable: Rc<NativeFn>,
    batched: bool,
}

impl Function {
    pub fn new<F>(callable: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + 'static,
    {
        Self {
            callable: Rc::new(callable),
            batched: false,
        }
    }

    /// The same callable, but every call runs inside one batch.
    #[must_use]
    pub fn into_action(self) -> Self {
        Self {
            callable: self.callable,
            batched: true,
        }
    }

    pub fn is_action(&self) -> bool {
        self.batched
    }

    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value> {
        if self.batched {
            Runtime::batch(|| (self.callable)(this, args))
        } else {
            (self.callable)(this, args)
        }
    }

    /// Identity of the underlying callable; an action shares it with the
    /// function it was made from.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        self.identity() == other.identity()
    }

    fn identity(&self) -> *const () {
        Rc::as_ptr(&self.callable) as *const ()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("action", &self.batched)
            .finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------
// Foreign objects
// ----------------------------------------------------------------------------

/// An opaque host object, the counterpart of a class instance.
#[derive(Clone)]
pub struct Foreign(Rc<dyn Any>);

impl Foreign {
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &Foreign) -> bool {
        self.identity() == other.identity()
    }

    fn identity(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl fmt::Debug for Foreign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Foreign(..)")
    }
}

// ----------------------------------------------------------------------------
// Values
// ----------------------------------------------------------------------------

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    /// A raw, unwrapped plain record.
    Record(Record),
    /// A raw, unwrapped plain sequence.
    List(List),
    /// A wrapped (tracked) record or sequence.
    Object(Observable),
    Function(Function),
    Foreign(Foreign),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_observable(&self) -> Option<&Observable> {
        match self {
            Value::Object(observable) => Some(observable),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Falsy: undefined, null, `false`, zero, `NaN` and the empty string.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Record(_) => "record",
            Value::List(_) => "list",
            Value::Object(_) => "observable",
            Value::Function(_) => "function",
            Value::Foreign(_) => "foreign",
        }
    }

    /// Strict equality.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => match (self.identity(), other.identity()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    fn identity(&self) -> Option<*const ()> {
        match self {
            Value::Record(record) => Some(record.identity()),
            Value::List(list) => Some(list.identity()),
            Value::Object(observable) => Some(observable.identity()),
            Value::Function(function) => Some(function.identity()),
            Value::Foreign(foreign) => Some(foreign.identity()),
            _ => None,
        }
    }

    /// String conversion used by `join`: nullish values become empty,
    /// integral numbers print without a fraction. A sequence met again while
    /// it is being converted prints as empty.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined | Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.to_string(),
            Value::Record(_) | Value::Foreign(_) => "[object Object]".to_string(),
            Value::List(list) => match Visit::enter(list.identity()) {
                Some(_visit) => list
                    .values()
                    .iter()
                    .map(Value::to_display_string)
                    .collect::<Vec<_>>()
                    .join(","),
                None => String::new(),
            },
            Value::Object(observable) => observable.display_raw(),
            Value::Function(_) => "function".to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Record(record) => fmt::Debug::fmt(record, f),
            Value::List(list) => fmt::Debug::fmt(list, f),
            Value::Object(observable) => fmt::Debug::fmt(observable, f),
            Value::Function(function) => fmt::Debug::fmt(function, f),
            Value::Foreign(foreign) => fmt::Debug::fmt(foreign, f),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<List> for Value {
    fn from(list: List) -> Self {
        Value::List(list)
    }
}

impl From<Observable> for Value {
    fn from(observable: Observable) -> Self {
        Value::Object(observable)
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

impl From<Foreign> for Value {
    fn from(foreign: Foreign) -> Self {
        Value::Foreign(foreign)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Undefined, Into::into)
    }
}
