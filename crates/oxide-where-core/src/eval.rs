//! Predicate evaluation.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, WhereError};
use crate::predicate::{Comparison, LikePattern, Operand, Operator, Predicate};
use crate::record::FieldAccess;
use crate::value::{Value, ValueKind};

/// Options that change how comparisons behave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchOptions {
    /// Whether `like`, `notLike` and the literal text operators ignore case.
    ///
    /// `iLike` and `notILike` always ignore case.
    pub case_insensitive_like: bool,
}

impl MatchOptions {
    /// Creates the default options (case-sensitive `LIKE`).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            case_insensitive_like: false,
        }
    }

    /// Sets whether `LIKE` ignores case.
    #[must_use]
    pub const fn case_insensitive_like(mut self, value: bool) -> Self {
        self.case_insensitive_like = value;
        self
    }
}

/// Evaluates predicates against records.
///
/// A matcher holds no per-evaluation state, so one instance can be shared
/// across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    options: MatchOptions,
}

/// Evaluates `predicate` against `record` with default options.
///
/// # Errors
///
/// See [`Matcher::matches`].
pub fn matches<R: FieldAccess + ?Sized>(record: &R, predicate: &Predicate) -> Result<bool> {
    Matcher::default().matches(record, predicate)
}

impl Matcher {
    /// Creates a matcher with the given options.
    #[must_use]
    pub const fn new(options: MatchOptions) -> Self {
        Self { options }
    }

    /// Returns the matcher's options.
    #[must_use]
    pub const fn options(&self) -> MatchOptions {
        self.options
    }

    /// Decides whether `record` satisfies `predicate`.
    ///
    /// Fields missing from the record compare as NULL. `And` and `Or`
    /// short-circuit, so an error in a term that is never reached is not
    /// reported.
    ///
    /// # Errors
    ///
    /// Returns [`WhereError::TypeMismatch`] when an operator is applied to
    /// value kinds it cannot compare, and [`WhereError::InvalidOperand`] when
    /// the operand has the wrong shape for its operator.
    pub fn matches<R: FieldAccess + ?Sized>(&self, record: &R, predicate: &Predicate) -> Result<bool> {
        match predicate {
            Predicate::Compare(comparison) => self.compare(record, comparison),
            Predicate::And(terms) => {
                for term in terms {
                    if !self.matches(record, term)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or(terms) => {
                for term in terms {
                    if self.matches(record, term)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not(inner) => Ok(!self.matches(record, inner)?),
        }
    }

    /// Returns the records that satisfy `predicate`, in input order.
    ///
    /// # Errors
    ///
    /// Stops at the first record whose evaluation fails.
    pub fn filter<'a, R, I>(&self, records: I, predicate: &Predicate) -> Result<Vec<&'a R>>
    where
        R: FieldAccess + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let mut out = Vec::new();
        for record in records {
            if self.matches(record, predicate)? {
                out.push(record);
            }
        }
        Ok(out)
    }

    fn compare<R: FieldAccess + ?Sized>(&self, record: &R, comparison: &Comparison) -> Result<bool> {
        let value = record.field(&comparison.field).unwrap_or(&Value::Null);
        let result = match comparison.operator {
            Operator::IsNull => value.is_null(),
            Operator::NotNull => !value.is_null(),
            Operator::Eq => value.equals(single(comparison)?),
            Operator::Ne => !value.equals(single(comparison)?),
            op @ (Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte) => {
                let operand = single(comparison)?;
                // NULL on either side is unknown, which never matches.
                match order(comparison, value, operand)? {
                    None => false,
                    Some(ordering) => match op {
                        Operator::Lt => ordering.is_lt(),
                        Operator::Lte => ordering.is_le(),
                        Operator::Gt => ordering.is_gt(),
                        _ => ordering.is_ge(),
                    },
                }
            }
            Operator::In => list(comparison)?.iter().any(|v| value.equals(v)),
            Operator::NotIn => !list(comparison)?.iter().any(|v| value.equals(v)),
            op @ (Operator::Between | Operator::NotBetween) => {
                let [low, high] = list(comparison)? else {
                    return Err(invalid_operand(comparison, "a list of two values"));
                };
                match (order(comparison, value, low)?, order(comparison, value, high)?) {
                    (Some(lower), Some(upper)) => {
                        let inside = lower.is_ge() && upper.is_le();
                        inside == (op == Operator::Between)
                    }
                    _ => false,
                }
            }
            op => self.pattern(comparison, op, value)?,
        };
        trace!(
            field = %comparison.field,
            operator = %comparison.operator,
            result,
            "evaluated comparison"
        );
        Ok(result)
    }

    fn pattern(&self, comparison: &Comparison, op: Operator, value: &Value) -> Result<bool> {
        let text = match value {
            Value::Null => return Ok(false),
            Value::Text(text) => text,
            other => return Err(mismatch(comparison, other.kind(), ValueKind::Text)),
        };
        let case_insensitive = match op {
            Operator::ILike | Operator::NotILike => true,
            _ => self.options.case_insensitive_like,
        };
        let hit = match &comparison.operand {
            Operand::Pattern(pattern) => pattern.is_match(text, case_insensitive)?,
            Operand::Value(Value::Text(source)) => {
                LikePattern::for_operator(op, source).is_match(text, case_insensitive)?
            }
            Operand::Value(other) => {
                return Err(mismatch(comparison, ValueKind::Text, other.kind()));
            }
            Operand::None | Operand::List(_) => {
                return Err(invalid_operand(comparison, "a text pattern"));
            }
        };
        Ok(match op {
            Operator::NotLike | Operator::NotILike => !hit,
            _ => hit,
        })
    }
}

/// Orders `value` against `operand`; `None` when either side is NULL.
fn order(comparison: &Comparison, value: &Value, operand: &Value) -> Result<Option<Ordering>> {
    if value.is_null() || operand.is_null() {
        return Ok(None);
    }
    value
        .compare(operand)
        .map(Some)
        .ok_or_else(|| mismatch(comparison, value.kind(), operand.kind()))
}

fn single(comparison: &Comparison) -> Result<&Value> {
    match &comparison.operand {
        Operand::Value(value) => Ok(value),
        _ => Err(invalid_operand(comparison, "a single value")),
    }
}

fn list(comparison: &Comparison) -> Result<&[Value]> {
    match &comparison.operand {
        Operand::List(values) => Ok(values),
        _ => Err(invalid_operand(comparison, "a list of values")),
    }
}

fn mismatch(comparison: &Comparison, value: ValueKind, operand: ValueKind) -> WhereError {
    WhereError::TypeMismatch {
        field: comparison.field.clone(),
        operator: comparison.operator.tag().to_string(),
        value,
        operand,
    }
}

fn invalid_operand(comparison: &Comparison, expected: &'static str) -> WhereError {
    WhereError::InvalidOperand {
        operator: comparison.operator.tag().to_string(),
        expected,
    }
}
