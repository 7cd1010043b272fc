//! Error types for predicate evaluation.

use thiserror::Error;

use crate::value::ValueKind;

/// Errors raised while building or evaluating predicates.
#[derive(Debug, Error)]
pub enum WhereError {
    /// An operator was applied to value kinds it cannot compare.
    #[error("cannot apply {operator} to field {field}: {value} vs {operand}")]
    TypeMismatch {
        /// Field the comparison was made on.
        field: String,
        /// Operator tag.
        operator: String,
        /// Kind of the record value.
        value: ValueKind,
        /// Kind of the operand.
        operand: ValueKind,
    },

    /// An operator tag outside the recognized set.
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// The operand has the wrong shape for the operator.
    #[error("operator {operator} expects {expected}")]
    InvalidOperand {
        /// Operator tag.
        operator: String,
        /// Description of the expected operand.
        expected: &'static str,
    },

    /// A LIKE pattern could not be compiled.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The original LIKE pattern.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// A JSON value that is not a scalar.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A where-object with an unexpected shape.
    #[error("invalid where clause: {0}")]
    InvalidWhere(String),
}

/// Result type alias for predicate operations.
pub type Result<T> = std::result::Result<T, WhereError>;
