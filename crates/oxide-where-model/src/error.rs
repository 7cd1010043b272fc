//! Error types for the model layer.

use std::collections::BTreeMap;

use oxide_where_core::WhereError;
use thiserror::Error;

/// Model-specific errors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Predicate construction or evaluation failed.
    #[error(transparent)]
    Where(#[from] WhereError),

    /// One or more validators rejected an instance.
    #[error("validation failed:\n{0}")]
    Validation(ValidationErrors),

    /// The model has no attribute with this name.
    #[error("unknown attribute {attribute} on model {model}")]
    UnknownAttribute {
        /// Model name.
        model: String,
        /// Attribute name.
        attribute: String,
    },

    /// Another row already holds the same values for a unique key.
    #[error("unique constraint violated on {}", .0.join(", "))]
    UniqueViolation(Vec<String>),

    /// The stored row backing an instance no longer exists.
    #[error("object not found")]
    NotFound,

    /// A value cannot be used for an attribute.
    #[error("invalid value for {attribute}: {message}")]
    InvalidValue {
        /// Attribute name.
        attribute: String,
        /// What was wrong.
        message: String,
    },
}

/// Collection of validation errors, keyed by attribute or validator name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    /// Errors keyed by field name.
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Creates a new empty ValidationErrors.
    pub const fn new() -> Self {
        Self {
            errors: BTreeMap::new(),
        }
    }

    /// Adds an error for a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Returns whether there are any errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of fields with errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns errors for a specific field.
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    /// Returns all errors as a flat list.
    pub fn all_errors(&self) -> Vec<(&str, &str)> {
        self.errors
            .iter()
            .flat_map(|(field, messages)| {
                messages
                    .iter()
                    .map(move |msg| (field.as_str(), msg.as_str()))
            })
            .collect()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (field, messages) in &self.errors {
            for message in messages {
                writeln!(f, "{field}: {message}")?;
            }
        }
        Ok(())
    }
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
