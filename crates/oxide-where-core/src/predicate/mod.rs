//! Predicate trees over record fields.
//!
//! A [`Predicate`] is either a comparison between one field and an operand,
//! or a boolean combination (`And`, `Or`, `Not`) of other predicates.
//!
//! # Example
//!
//! ```
//! use oxide_where_core::{matches, Predicate, Record};
//!
//! let record = Record::new().with("title", "Boat-abc").with("rand", 900);
//! let predicate = Predicate::lt("rand", 1000).or(Predicate::is_null("rand"));
//! assert!(matches(&record, &predicate).unwrap());
//! ```

mod like;
mod operator;

use std::fmt;

pub use like::{escape as escape_like, LikePattern};
pub use operator::{OperandShape, Operator};

use crate::error::Result;
use crate::value::{IntoValue, Value};

/// The right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand (`isNull`, `notNull`).
    None,
    /// A single literal.
    Value(Value),
    /// A list of literals (`in`, `between`, ...).
    List(Vec<Value>),
    /// A `LIKE` pattern.
    Pattern(LikePattern),
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Vec<Value>> for Operand {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Value(v) => write!(f, "{v}"),
            Self::List(values) => {
                f.write_str("(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str(")")
            }
            Self::Pattern(p) => write!(f, "{}", Value::Text(p.as_str().to_string())),
        }
    }
}

/// A comparison between one field and an operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Field name looked up in the record.
    pub field: String,
    /// Operator applied.
    pub operator: Operator,
    /// Right-hand side.
    pub operand: Operand,
}

impl Comparison {
    /// Creates a comparison.
    ///
    /// A text operand given to a pattern operator is compiled into a
    /// [`LikePattern`] up front so repeated evaluations reuse it.
    pub fn new(field: impl Into<String>, operator: Operator, operand: Operand) -> Self {
        let operand = match (operator.operand_shape(), operand) {
            (OperandShape::Pattern, Operand::Value(Value::Text(text))) => {
                Operand::Pattern(LikePattern::for_operator(operator, &text))
            }
            (_, operand) => operand,
        };
        Self {
            field: field.into(),
            operator,
            operand,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            field,
            operator,
            operand,
        } = self;
        match (operator, operand) {
            (Operator::IsNull | Operator::NotNull, _) => write!(f, "{field} {}", operator.sql()),
            (Operator::Between | Operator::NotBetween, Operand::List(values))
                if values.len() == 2 =>
            {
                write!(
                    f,
                    "{field} {} {} AND {}",
                    operator.sql(),
                    values[0],
                    values[1]
                )
            }
            _ => write!(f, "{field} {} {operand}", operator.sql()),
        }
    }
}

/// A boolean expression tree over record fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field comparison.
    Compare(Comparison),
    /// True iff every sub-predicate is true; empty is true.
    And(Vec<Predicate>),
    /// True iff any sub-predicate is true; empty is false.
    Or(Vec<Predicate>),
    /// Negation.
    Not(Box<Predicate>),
}

fn value_comparison<V: IntoValue>(field: &str, operator: Operator, value: V) -> Predicate {
    Predicate::Compare(Comparison::new(
        field,
        operator,
        Operand::Value(value.into_value()),
    ))
}

fn list_comparison<V: IntoValue>(field: &str, operator: Operator, values: Vec<V>) -> Predicate {
    Predicate::Compare(Comparison::new(
        field,
        operator,
        Operand::List(values.into_iter().map(IntoValue::into_value).collect()),
    ))
}

fn pattern_comparison(field: &str, operator: Operator, text: &str) -> Predicate {
    Predicate::Compare(Comparison::new(
        field,
        operator,
        Operand::Pattern(LikePattern::for_operator(operator, text)),
    ))
}

impl Predicate {
    /// Creates a comparison from an operator tag.
    ///
    /// # Errors
    ///
    /// Returns [`WhereError::UnknownOperator`](crate::WhereError::UnknownOperator)
    /// if `operator` is not a recognized tag.
    pub fn compare(field: &str, operator: &str, operand: impl Into<Operand>) -> Result<Self> {
        let operator: Operator = operator.parse()?;
        Ok(Self::Compare(Comparison::new(
            field,
            operator,
            operand.into(),
        )))
    }

    /// Creates an equality predicate (field = value).
    pub fn eq<V: IntoValue>(field: &str, value: V) -> Self {
        value_comparison(field, Operator::Eq, value)
    }

    /// Creates an inequality predicate (field != value).
    pub fn ne<V: IntoValue>(field: &str, value: V) -> Self {
        value_comparison(field, Operator::Ne, value)
    }

    /// Creates a less-than predicate (field < value).
    pub fn lt<V: IntoValue>(field: &str, value: V) -> Self {
        value_comparison(field, Operator::Lt, value)
    }

    /// Creates a less-than-or-equal predicate (field <= value).
    pub fn lte<V: IntoValue>(field: &str, value: V) -> Self {
        value_comparison(field, Operator::Lte, value)
    }

    /// Creates a greater-than predicate (field > value).
    pub fn gt<V: IntoValue>(field: &str, value: V) -> Self {
        value_comparison(field, Operator::Gt, value)
    }

    /// Creates a greater-than-or-equal predicate (field >= value).
    pub fn gte<V: IntoValue>(field: &str, value: V) -> Self {
        value_comparison(field, Operator::Gte, value)
    }

    /// Creates a LIKE predicate.
    ///
    /// Use `%` for any substring and `_` for any single character.
    pub fn like(field: &str, pattern: &str) -> Self {
        pattern_comparison(field, Operator::Like, pattern)
    }

    /// Creates a NOT LIKE predicate.
    pub fn not_like(field: &str, pattern: &str) -> Self {
        pattern_comparison(field, Operator::NotLike, pattern)
    }

    /// Creates a case-insensitive LIKE predicate.
    pub fn ilike(field: &str, pattern: &str) -> Self {
        pattern_comparison(field, Operator::ILike, pattern)
    }

    /// Creates a case-insensitive NOT LIKE predicate.
    pub fn not_ilike(field: &str, pattern: &str) -> Self {
        pattern_comparison(field, Operator::NotILike, pattern)
    }

    /// Creates a starts-with predicate; wildcards in `prefix` are literal.
    pub fn starts_with(field: &str, prefix: &str) -> Self {
        pattern_comparison(field, Operator::StartsWith, prefix)
    }

    /// Creates an ends-with predicate; wildcards in `suffix` are literal.
    pub fn ends_with(field: &str, suffix: &str) -> Self {
        pattern_comparison(field, Operator::EndsWith, suffix)
    }

    /// Creates a contains predicate; wildcards in `text` are literal.
    pub fn substring(field: &str, text: &str) -> Self {
        pattern_comparison(field, Operator::Substring, text)
    }

    /// Creates an IN list predicate.
    pub fn in_list<V: IntoValue>(field: &str, values: Vec<V>) -> Self {
        list_comparison(field, Operator::In, values)
    }

    /// Creates a NOT IN list predicate.
    pub fn not_in_list<V: IntoValue>(field: &str, values: Vec<V>) -> Self {
        list_comparison(field, Operator::NotIn, values)
    }

    /// Creates an inclusive BETWEEN predicate (low <= field <= high).
    pub fn between<V: IntoValue>(field: &str, low: V, high: V) -> Self {
        list_comparison(field, Operator::Between, vec![low, high])
    }

    /// Creates a NOT BETWEEN predicate.
    pub fn not_between<V: IntoValue>(field: &str, low: V, high: V) -> Self {
        list_comparison(field, Operator::NotBetween, vec![low, high])
    }

    /// Creates an IS NULL predicate.
    pub fn is_null(field: &str) -> Self {
        Self::Compare(Comparison::new(field, Operator::IsNull, Operand::None))
    }

    /// Creates an IS NOT NULL predicate.
    pub fn not_null(field: &str) -> Self {
        Self::Compare(Comparison::new(field, Operator::NotNull, Operand::None))
    }

    /// Conjunction of all `predicates`.
    #[must_use]
    pub fn all(predicates: Vec<Self>) -> Self {
        Self::And(predicates)
    }

    /// Disjunction of all `predicates`.
    #[must_use]
    pub fn any(predicates: Vec<Self>) -> Self {
        Self::Or(predicates)
    }

    /// Combines this predicate with another using AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::And(mut terms) => {
                terms.push(other);
                Self::And(terms)
            }
            this => Self::And(vec![this, other]),
        }
    }

    /// Combines this predicate with another using OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Or(mut terms) => {
                terms.push(other);
                Self::Or(terms)
            }
            this => Self::Or(vec![this, other]),
        }
    }

    /// Negates this predicate.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Returns the distinct field names the predicate reads, in first-use order.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Compare(c) => {
                if !out.contains(&c.field.as_str()) {
                    out.push(&c.field);
                }
            }
            Self::And(terms) | Self::Or(terms) => {
                for term in terms {
                    term.collect_fields(out);
                }
            }
            Self::Not(inner) => inner.collect_fields(out),
        }
    }
}

impl From<Comparison> for Predicate {
    fn from(comparison: Comparison) -> Self {
        Self::Compare(comparison)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, terms: &[Predicate], sep: &str) -> fmt::Result {
            for (i, term) in terms.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "({term})")?;
            }
            Ok(())
        }

        match self {
            Self::Compare(c) => write!(f, "{c}"),
            Self::And(terms) if terms.is_empty() => f.write_str("TRUE"),
            Self::Or(terms) if terms.is_empty() => f.write_str("FALSE"),
            Self::And(terms) => join(f, terms, " AND "),
            Self::Or(terms) => join(f, terms, " OR "),
            Self::Not(inner) => write!(f, "NOT ({inner})"),
        }
    }
}
