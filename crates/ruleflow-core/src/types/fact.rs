//! Fact type: the unit of input and output for rule execution
//!
//! A fact is a named-field record. Fields are addressed with dot-notation
//! paths (e.g. `customer.age`); a missing path reads as `Value::Null` so
//! rules can handle absent fields gracefully.

use super::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single input/output record for rule evaluation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fact {
    fields: HashMap<String, Value>,
}

impl Fact {
    /// Create an empty fact
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a top-level field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Remove a top-level field, returning the previous value if any
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Get a value by dot-notation path, `Value::Null` if any segment is missing
    pub fn get_path(&self, path: &str) -> Value {
        let mut current: Option<&Value> = None;
        for (i, segment) in path.split('.').enumerate() {
            current = if i == 0 {
                self.fields.get(segment)
            } else {
                match current {
                    Some(Value::Object(map)) => map.get(segment),
                    _ => None,
                }
            };
            if current.is_none() {
                return Value::Null;
            }
        }
        current.cloned().unwrap_or(Value::Null)
    }

    /// Set a value by dot-notation path, creating intermediate objects
    pub fn set_path(&mut self, path: &str, value: Value) {
        match path.split_once('.') {
            None => {
                self.fields.insert(path.to_string(), value);
            }
            Some((head, rest)) => {
                let slot = self
                    .fields
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Object(HashMap::new()));
                set_nested(slot, rest, value);
            }
        }
    }

    /// Number of top-level fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the fact has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over top-level fields
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Consume the fact and return the underlying map
    pub fn into_inner(self) -> HashMap<String, Value> {
        self.fields
    }
}

/// Descend into `slot`, replacing non-object intermediates, and write the
/// final segment
fn set_nested(slot: &mut Value, path: &str, value: Value) {
    if !matches!(slot, Value::Object(_)) {
        *slot = Value::Object(HashMap::new());
    }
    let Value::Object(map) = slot else { return };

    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let next = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(HashMap::new()));
            set_nested(next, rest, value);
        }
    }
}

impl From<HashMap<String, Value>> for Fact {
    fn from(fields: HashMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl FromIterator<(String, Value)> for Fact {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
