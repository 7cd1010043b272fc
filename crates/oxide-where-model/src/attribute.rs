//! Attribute definitions for models.

use std::fmt;
use std::sync::Arc;

use oxide_where_core::{IntoValue, Value};

use crate::error::Result;
use crate::instance::Instance;
use crate::validation::{InValidator, MaxValidator, MinValidator, Validator};

/// Computes an attribute's value from an instance.
pub type Getter = Arc<dyn Fn(&Instance) -> Value + Send + Sync>;

/// Stores a value into an instance, possibly across several attributes.
pub type Setter = Arc<dyn Fn(&mut Instance, Value) -> Result<()> + Send + Sync>;

/// The data type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Whole numbers.
    Integer,
    /// Integers or floats.
    Float,
    /// Text.
    Text,
    /// Booleans.
    Boolean,
    /// Timestamps.
    Date,
    /// Not stored; defined only by a getter and/or setter.
    Virtual,
}

impl DataType {
    /// Returns whether a non-null value is acceptable for this type.
    pub const fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Virtual, _)
                | (_, Value::Null)
                | (Self::Integer, Value::Int(_))
                | (Self::Float, Value::Int(_) | Value::Float(_))
                | (Self::Text, Value::Text(_))
                | (Self::Boolean, Value::Bool(_))
                | (Self::Date, Value::Date(_))
        )
    }

    /// Returns a lowercase name for messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Virtual => "virtual",
        }
    }
}

/// A model attribute.
///
/// # Example
///
/// ```
/// use oxide_where_model::Attribute;
///
/// let latitude = Attribute::integer("latitude").min(-90.0).max(90.0);
/// let color = Attribute::text("favoriteColor").default_value("green");
/// ```
#[derive(Clone)]
pub struct Attribute {
    name: String,
    data_type: DataType,
    allow_null: bool,
    default: Option<Value>,
    unique: bool,
    validators: Vec<Arc<dyn Validator>>,
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl Attribute {
    /// Creates an attribute of the given type.
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            allow_null: true,
            default: None,
            unique: false,
            validators: Vec::new(),
            getter: None,
            setter: None,
        }
    }

    /// Creates an integer attribute.
    pub fn integer(name: &str) -> Self {
        Self::new(name, DataType::Integer)
    }

    /// Creates a float attribute.
    pub fn float(name: &str) -> Self {
        Self::new(name, DataType::Float)
    }

    /// Creates a text attribute.
    pub fn text(name: &str) -> Self {
        Self::new(name, DataType::Text)
    }

    /// Creates a boolean attribute.
    pub fn boolean(name: &str) -> Self {
        Self::new(name, DataType::Boolean)
    }

    /// Creates a timestamp attribute.
    pub fn date(name: &str) -> Self {
        Self::new(name, DataType::Date)
    }

    /// Creates a virtual attribute, backed only by a getter and setter.
    pub fn virtual_field(name: &str) -> Self {
        Self::new(name, DataType::Virtual)
    }

    /// Sets whether NULL is allowed.
    #[must_use]
    pub const fn allow_null(mut self, value: bool) -> Self {
        self.allow_null = value;
        self
    }

    /// Sets the default value used when an instance is built.
    #[must_use]
    pub fn default_value<V: IntoValue>(mut self, value: V) -> Self {
        self.default = Some(value.into_value());
        self
    }

    /// Requires values to be unique across stored rows.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Adds a validator.
    #[must_use]
    pub fn validate(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Adds a minimum-value validator.
    #[must_use]
    pub fn min(self, min: f64) -> Self {
        self.validate(MinValidator::new(min))
    }

    /// Adds a maximum-value validator.
    #[must_use]
    pub fn max(self, max: f64) -> Self {
        self.validate(MaxValidator::new(max))
    }

    /// Restricts the attribute to one of `values`.
    #[must_use]
    pub fn is_in<V: IntoValue>(self, values: Vec<V>) -> Self {
        self.validate(InValidator::new(
            values.into_iter().map(IntoValue::into_value).collect(),
        ))
    }

    /// Sets a getter, run by [`Instance::get`].
    #[must_use]
    pub fn getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&Instance) -> Value + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(getter));
        self
    }

    /// Sets a setter, run by [`Instance::set`].
    #[must_use]
    pub fn setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&mut Instance, Value) -> Result<()> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    /// Returns the attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the data type.
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns whether the attribute is virtual.
    pub fn is_virtual(&self) -> bool {
        self.data_type == DataType::Virtual
    }

    /// Returns whether NULL is allowed.
    pub const fn allows_null(&self) -> bool {
        self.allow_null
    }

    /// Returns the default value.
    pub const fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns whether values must be unique.
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns the attribute validators.
    pub fn validators(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }

    /// Returns the getter, if any.
    pub const fn getter_fn(&self) -> Option<&Getter> {
        self.getter.as_ref()
    }

    /// Returns the setter, if any.
    pub const fn setter_fn(&self) -> Option<&Setter> {
        self.setter.as_ref()
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("data_type", &self.data_type)
            .field("allow_null", &self.allow_null)
            .field("default", &self.default)
            .field("unique", &self.unique)
            .field("validators", &self.validators.len())
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let attr = Attribute::text("name");
        assert!(attr.allows_null());
        assert!(attr.default().is_none());
        assert!(!attr.is_unique());
        assert!(!attr.is_virtual());
    }

    #[test]
    fn test_builder() {
        let attr = Attribute::boolean("flag")
            .allow_null(false)
            .default_value(true)
            .unique();
        assert!(!attr.allows_null());
        assert_eq!(attr.default(), Some(&Value::Bool(true)));
        assert!(attr.is_unique());
    }

    #[test]
    fn test_min_max_add_validators() {
        let attr = Attribute::integer("latitude").min(-90.0).max(90.0);
        assert_eq!(attr.validators().len(), 2);
    }

    #[test]
    fn test_is_in_adds_validator() {
        let attr = Attribute::text("status").is_in(vec!["active", "inactive"]);
        let [validator] = attr.validators() else {
            panic!("expected one validator");
        };
        assert!(validator.validate(&Value::Text("active".to_string())).is_ok());
        assert!(validator.validate(&Value::Text("archived".to_string())).is_err());
    }

    #[test]
    fn test_data_type_accepts() {
        assert!(DataType::Integer.accepts(&Value::Int(1)));
        assert!(!DataType::Integer.accepts(&Value::Float(1.5)));
        assert!(DataType::Float.accepts(&Value::Int(1)));
        assert!(DataType::Text.accepts(&Value::Null));
        assert!(!DataType::Text.accepts(&Value::Bool(true)));
        assert!(DataType::Virtual.accepts(&Value::Bool(true)));
    }
}
