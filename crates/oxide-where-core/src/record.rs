//! Records and the field-access capability predicates evaluate against.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WhereError};
use crate::value::{IntoValue, Value};

/// Capability to look up a field value by name.
///
/// Anything a predicate is evaluated against implements this trait. A
/// `None` result means the field is absent, which predicates treat as NULL.
pub trait FieldAccess {
    /// Returns the value stored under `name`, if any.
    fn field(&self, name: &str) -> Option<&Value>;
}

impl<T: FieldAccess + ?Sized> FieldAccess for &T {
    fn field(&self, name: &str) -> Option<&Value> {
        (**self).field(name)
    }
}

impl FieldAccess for BTreeMap<String, Value> {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl<S: std::hash::BuildHasher> FieldAccess for HashMap<String, Value, S> {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// A row-equivalent mapping of field names to scalar values.
///
/// # Example
///
/// ```
/// use oxide_where_core::{Record, Value};
///
/// let record = Record::new().with("title", "Boat-abc").with("rand", 900);
/// assert_eq!(record.get("rand"), Some(&Value::Int(900)));
/// assert_eq!(record.get("missing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field, returning the record.
    #[must_use]
    pub fn with<V: IntoValue>(mut self, name: &str, value: V) -> Self {
        self.set(name, value);
        self
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets a field, returning the previous value.
    pub fn set<V: IntoValue>(&mut self, name: &str, value: V) -> Option<Value> {
        self.fields.insert(name.to_string(), value.into_value())
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Returns whether the record has a field with this name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Builds a record from a JSON object.
    ///
    /// # Errors
    ///
    /// Fails if `json` is not an object or holds a non-scalar field.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| WhereError::InvalidValue(format!("expected an object, got {json}")))?;
        let mut record = Self::new();
        for (name, value) in object {
            record.fields.insert(name.clone(), Value::from_json(value)?);
        }
        Ok(record)
    }

    /// Renders the record as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl FieldAccess for Record {
    fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
