//! Attribute validators.
//!
//! Validators only see non-null values; NULL is governed by the attribute's
//! `allow_null` flag instead.

use std::fmt;
use std::sync::Arc;

use oxide_where_core::Value;
use regex::Regex;

use crate::error::{ModelError, Result};
use crate::instance::Instance;

/// Trait for attribute validators.
pub trait Validator: Send + Sync {
    /// Validates a value and returns an error message if invalid.
    fn validate(&self, value: &Value) -> std::result::Result<(), String>;

    /// Returns the error message for this validator.
    fn message(&self) -> &str;
}

/// Validator that enforces a minimum numeric value.
#[derive(Debug, Clone)]
pub struct MinValidator {
    min: f64,
    message: String,
}

impl MinValidator {
    /// Creates a new MinValidator.
    pub fn new(min: f64) -> Self {
        Self {
            min,
            message: format!("Ensure this value is greater than or equal to {min}."),
        }
    }

    /// Creates a new MinValidator with custom message.
    pub fn with_message(min: f64, message: impl Into<String>) -> Self {
        Self {
            min,
            message: message.into(),
        }
    }
}

impl Validator for MinValidator {
    fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match value.as_f64() {
            Some(n) if n >= self.min => Ok(()),
            _ => Err(self.message.clone()),
        }
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// Validator that enforces a maximum numeric value.
#[derive(Debug, Clone)]
pub struct MaxValidator {
    max: f64,
    message: String,
}

impl MaxValidator {
    /// Creates a new MaxValidator.
    pub fn new(max: f64) -> Self {
        Self {
            max,
            message: format!("Ensure this value is less than or equal to {max}."),
        }
    }

    /// Creates a new MaxValidator with custom message.
    pub fn with_message(max: f64, message: impl Into<String>) -> Self {
        Self {
            max,
            message: message.into(),
        }
    }
}

impl Validator for MaxValidator {
    fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match value.as_f64() {
            Some(n) if n <= self.max => Ok(()),
            _ => Err(self.message.clone()),
        }
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// Validator that bounds the character length of text.
#[derive(Debug, Clone)]
pub struct LengthValidator {
    min: usize,
    max: usize,
    message: String,
}

impl LengthValidator {
    /// Creates a new LengthValidator accepting `min..=max` characters.
    pub fn new(min: usize, max: usize) -> Self {
        Self {
            min,
            max,
            message: format!("Ensure this value has between {min} and {max} characters."),
        }
    }
}

impl Validator for LengthValidator {
    fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match value.as_str().map(|s| s.chars().count()) {
            Some(len) if (self.min..=self.max).contains(&len) => Ok(()),
            _ => Err(self.message.clone()),
        }
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// Validator that rejects empty or whitespace-only text.
#[derive(Debug, Clone)]
pub struct NotEmptyValidator {
    message: String,
}

impl NotEmptyValidator {
    /// Creates a new NotEmptyValidator with default message.
    pub fn new() -> Self {
        Self {
            message: "This field may not be empty.".to_string(),
        }
    }
}

impl Default for NotEmptyValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for NotEmptyValidator {
    fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match value {
            Value::Text(s) if s.trim().is_empty() => Err(self.message.clone()),
            _ => Ok(()),
        }
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// Validator that requires text to match a regular expression.
#[derive(Debug, Clone)]
pub struct PatternValidator {
    regex: Regex,
    message: String,
}

impl PatternValidator {
    /// Creates a new PatternValidator.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidValue`] if `pattern` is not a valid regex.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| ModelError::InvalidValue {
            attribute: "pattern".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            regex,
            message: "Enter a valid value.".to_string(),
        })
    }

    /// Replaces the error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Validator for PatternValidator {
    fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match value.as_str() {
            Some(s) if self.regex.is_match(s) => Ok(()),
            _ => Err(self.message.clone()),
        }
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// Validator that only accepts one of a fixed set of values.
#[derive(Debug, Clone)]
pub struct InValidator {
    allowed: Vec<Value>,
    message: String,
}

impl InValidator {
    /// Creates a new InValidator accepting any value equal to one in `allowed`.
    pub fn new(allowed: Vec<Value>) -> Self {
        let listed = allowed
            .iter()
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            allowed,
            message: format!("Value must be one of: {listed}."),
        }
    }

    /// Replaces the error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Validator for InValidator {
    fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        if self.allowed.iter().any(|allowed| allowed.equals(value)) {
            Ok(())
        } else {
            Err(self.message.clone())
        }
    }

    fn message(&self) -> &str {
        &self.message
    }
}

type ModelCheck = dyn Fn(&Instance) -> std::result::Result<(), String> + Send + Sync;

/// A named check over a whole instance, run after attribute validators.
#[derive(Clone)]
pub struct ModelValidator {
    name: String,
    check: Arc<ModelCheck>,
}

impl ModelValidator {
    /// Creates a model validator.
    pub fn new<F>(name: &str, check: F) -> Self
    where
        F: Fn(&Instance) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            check: Arc::new(check),
        }
    }

    /// Returns the validator's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the check.
    pub fn check(&self, instance: &Instance) -> std::result::Result<(), String> {
        (self.check)(instance)
    }
}

impl fmt::Debug for ModelValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelValidator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
