//! Building plain data from JSON.
//!
//! Only the inbound direction exists: JSON documents become raw records and
//! lists that can then be wrapped.

use serde_json::Value as Json;

use super::{List, Record, Value};

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => n.as_f64().map_or(Value::Number(f64::NAN), Value::Number),
            Json::String(s) => Value::from(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(fields) => {
                let record = Record::new();
                for (key, field) in fields {
                    record.insert(key, Value::from(field));
                }
                Value::Record(record)
            }
        }
    }
}

impl From<&Json> for Value {
    fn from(json: &Json) -> Self {
        Value::from(json.clone())
    }
}

impl From<Json> for List {
    fn from(json: Json) -> Self {
        match json {
            Json::Array(items) => items.into_iter().map(Value::from).collect(),
            other => std::iter::once(Value::from(other)).collect(),
        }
    }
}
