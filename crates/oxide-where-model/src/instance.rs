//! Model instances.

use std::fmt;
use std::sync::Arc;

use oxide_where_core::{FieldAccess, IntoValue, Record, Value};

use crate::error::{ModelError, Result, ValidationErrors};
use crate::model::ModelDefinition;

/// One row of a model, with its getters and setters.
///
/// Stored values live in a plain [`Record`]. [`Instance::get`] and
/// [`Instance::set`] go through the attribute's getter and setter, while
/// [`Instance::get_data_value`] and [`Instance::set_data_value`] bypass them.
/// Predicates see the stored values only.
#[derive(Clone)]
pub struct Instance {
    model: Arc<ModelDefinition>,
    data: Record,
    new_record: bool,
}

impl Instance {
    pub(crate) const fn from_parts(model: Arc<ModelDefinition>, data: Record, new_record: bool) -> Self {
        Self {
            model,
            data,
            new_record,
        }
    }

    /// Returns the model definition.
    pub fn model(&self) -> &Arc<ModelDefinition> {
        &self.model
    }

    /// Returns whether the instance has not been stored yet.
    pub const fn is_new_record(&self) -> bool {
        self.new_record
    }

    pub(crate) fn mark_stored(&mut self) {
        self.new_record = false;
    }

    /// Returns the primary key value, NULL if unassigned.
    pub fn pk(&self) -> Value {
        self.data
            .get(self.model.primary_key())
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Returns the stored values.
    pub const fn data(&self) -> &Record {
        &self.data
    }

    /// Consumes the instance, returning its stored values.
    pub fn into_data(self) -> Record {
        self.data
    }

    /// Reads an attribute, running its getter if it has one.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownAttribute`] if the model has no such
    /// attribute.
    pub fn get(&self, name: &str) -> Result<Value> {
        let attribute = self
            .model
            .attribute(name)
            .ok_or_else(|| self.unknown(name))?;
        Ok(match attribute.getter_fn() {
            Some(getter) => getter(self),
            None => self.data.get(name).cloned().unwrap_or(Value::Null),
        })
    }

    /// Writes an attribute, running its setter if it has one.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownAttribute`] for an unknown attribute,
    /// [`ModelError::InvalidValue`] for a virtual attribute without a setter,
    /// or whatever the setter returns.
    pub fn set<V: IntoValue>(&mut self, name: &str, value: V) -> Result<()> {
        let model = Arc::clone(&self.model);
        let attribute = model.attribute(name).ok_or_else(|| self.unknown(name))?;
        if let Some(setter) = attribute.setter_fn() {
            return setter(self, value.into_value());
        }
        if attribute.is_virtual() {
            return Err(ModelError::InvalidValue {
                attribute: name.to_string(),
                message: "virtual attribute has no setter".to_string(),
            });
        }
        self.data.set(name, value);
        Ok(())
    }

    /// Reads a stored value, bypassing getters.
    pub fn get_data_value(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Writes a stored value, bypassing setters.
    pub fn set_data_value<V: IntoValue>(&mut self, name: &str, value: V) {
        self.data.set(name, value);
    }

    /// Adds `by` to a numeric attribute. NULL stays NULL, as in SQL.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidValue`] if the attribute is not numeric
    /// or the sum overflows.
    pub fn increment<V: IntoValue>(&mut self, name: &str, by: V) -> Result<()> {
        if self.model.attribute(name).is_none() {
            return Err(self.unknown(name));
        }
        let current = self.data.get(name).cloned().unwrap_or(Value::Null);
        let invalid = |message: &str| ModelError::InvalidValue {
            attribute: name.to_string(),
            message: message.to_string(),
        };
        let next = match (current, by.into_value()) {
            (Value::Null, _) => Value::Null,
            (Value::Int(a), Value::Int(b)) => {
                Value::Int(a.checked_add(b).ok_or_else(|| invalid("integer overflow"))?)
            }
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => Value::Float(x + y),
                _ => return Err(invalid("cannot increment a non-numeric value")),
            },
        };
        self.data.set(name, next);
        Ok(())
    }

    /// Subtracts `by` from a numeric attribute.
    ///
    /// # Errors
    ///
    /// See [`Instance::increment`].
    pub fn decrement(&mut self, name: &str, by: i64) -> Result<()> {
        let by = by.checked_neg().ok_or_else(|| ModelError::InvalidValue {
            attribute: name.to_string(),
            message: "integer overflow".to_string(),
        })?;
        self.increment(name, by)
    }

    /// Checks types, NULL constraints, attribute validators and model
    /// validators, collecting every failure.
    ///
    /// The primary key may be NULL on a new record; it is assigned on insert.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Validation`] listing all failures.
    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        for attribute in self.model.stored_attributes() {
            let name = attribute.name();
            let value = self.data.get(name).unwrap_or(&Value::Null);
            if value.is_null() {
                let assigned_later = self.new_record && name == self.model.primary_key();
                if !attribute.allows_null() && !assigned_later {
                    errors.add(name, "This field cannot be null.");
                }
                continue;
            }
            if !attribute.data_type().accepts(value) {
                errors.add(name, ModelDefinition::type_message(attribute, value));
                continue;
            }
            for validator in attribute.validators() {
                if let Err(message) = validator.validate(value) {
                    errors.add(name, message);
                }
            }
        }
        for validator in self.model.validators() {
            if let Err(message) = validator.check(self) {
                errors.add(validator.name(), message);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ModelError::Validation(errors))
        }
    }

    /// Renders every attribute through its getter as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for attribute in self.model.attributes() {
            let name = attribute.name();
            let value = match attribute.getter_fn() {
                Some(getter) => getter(self),
                None => match self.data.get(name) {
                    Some(value) => value.clone(),
                    // Projected rows only carry the selected attributes.
                    None => continue,
                },
            };
            object.insert(name.to_string(), value.to_json());
        }
        for (name, value) in self.data.iter() {
            if self.model.attribute(name).is_none() {
                object.insert(name.to_string(), value.to_json());
            }
        }
        serde_json::Value::Object(object)
    }

    fn unknown(&self, name: &str) -> ModelError {
        ModelError::UnknownAttribute {
            model: self.model.name().to_string(),
            attribute: name.to_string(),
        }
    }
}

impl FieldAccess for Instance {
    fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("model", &self.model.name())
            .field("data", &self.data)
            .field("new_record", &self.new_record)
            .finish()
    }
}
