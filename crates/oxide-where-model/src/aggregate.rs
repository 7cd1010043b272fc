//! Aggregate functions over stored rows.
//!
//! Results follow SQL: NULL inputs are skipped, and `SUM`, `AVG`, `MAX`,
//! `MIN` and `GROUP_CONCAT` of no values are NULL.

use std::cmp::Ordering;

use chrono::SecondsFormat;
use oxide_where_core::{Record, Value};

use crate::error::{ModelError, Result};

/// An aggregate function that can be applied to a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate {
    /// COUNT aggregate
    Count {
        /// Column to count, or "*" for all rows
        column: String,
        /// Whether to count only distinct values
        distinct: bool,
    },
    /// SUM aggregate
    Sum {
        /// Column to sum
        column: String,
    },
    /// AVG aggregate
    Avg {
        /// Column to average
        column: String,
    },
    /// MAX aggregate
    Max {
        /// Column to find maximum
        column: String,
    },
    /// MIN aggregate
    Min {
        /// Column to find minimum
        column: String,
    },
    /// GROUP_CONCAT aggregate
    GroupConcat {
        /// Column to concatenate
        column: String,
        /// Text placed between values
        separator: String,
    },
}

impl Aggregate {
    /// Creates a COUNT(*) aggregate.
    pub fn count_all() -> Self {
        Self::Count {
            column: "*".to_string(),
            distinct: false,
        }
    }

    /// Creates a COUNT(column) aggregate.
    pub fn count(column: &str) -> Self {
        Self::Count {
            column: column.to_string(),
            distinct: false,
        }
    }

    /// Creates a COUNT(DISTINCT column) aggregate.
    pub fn count_distinct(column: &str) -> Self {
        Self::Count {
            column: column.to_string(),
            distinct: true,
        }
    }

    /// Creates a SUM(column) aggregate.
    pub fn sum(column: &str) -> Self {
        Self::Sum {
            column: column.to_string(),
        }
    }

    /// Creates an AVG(column) aggregate.
    pub fn avg(column: &str) -> Self {
        Self::Avg {
            column: column.to_string(),
        }
    }

    /// Creates a MAX(column) aggregate.
    pub fn max(column: &str) -> Self {
        Self::Max {
            column: column.to_string(),
        }
    }

    /// Creates a MIN(column) aggregate.
    pub fn min(column: &str) -> Self {
        Self::Min {
            column: column.to_string(),
        }
    }

    /// Creates a GROUP_CONCAT(column) aggregate with a `,` separator.
    pub fn group_concat(column: &str) -> Self {
        Self::group_concat_with(column, ",")
    }

    /// Creates a GROUP_CONCAT(column, separator) aggregate.
    pub fn group_concat_with(column: &str, separator: &str) -> Self {
        Self::GroupConcat {
            column: column.to_string(),
            separator: separator.to_string(),
        }
    }

    /// Computes the aggregate over `rows`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidValue`] when `SUM` or `AVG` meet a
    /// non-numeric value, or an integer sum overflows.
    pub fn compute<'a, I>(&self, rows: I) -> Result<Value>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let column = self.column();
        let rows = rows.into_iter();
        if let Self::Count { column, .. } = self {
            if column == "*" {
                return Ok(Value::Int(count_to_int(rows.count())));
            }
        }
        let values: Vec<&Value> = rows
            .filter_map(|row| row.get(column))
            .filter(|v| !v.is_null())
            .collect();

        match self {
            Self::Count { distinct, .. } => {
                let n = if *distinct {
                    let mut seen: Vec<&Value> = Vec::new();
                    for value in values {
                        if !seen.iter().any(|s| s.equals(value)) {
                            seen.push(value);
                        }
                    }
                    seen.len()
                } else {
                    values.len()
                };
                Ok(Value::Int(count_to_int(n)))
            }
            Self::Sum { .. } => sum(column, &values),
            Self::Avg { .. } => {
                if values.is_empty() {
                    return Ok(Value::Null);
                }
                let total = sum(column, &values)?.as_f64().unwrap_or_default();
                #[allow(clippy::cast_precision_loss)]
                let n = values.len() as f64;
                Ok(Value::Float(total / n))
            }
            Self::Max { .. } => Ok(extreme(&values, Ordering::Greater)),
            Self::Min { .. } => Ok(extreme(&values, Ordering::Less)),
            Self::GroupConcat { separator, .. } => {
                if values.is_empty() {
                    return Ok(Value::Null);
                }
                let parts: Vec<String> = values.iter().copied().map(concat_text).collect();
                Ok(Value::Text(parts.join(separator)))
            }
        }
    }

    fn column(&self) -> &str {
        match self {
            Self::Count { column, .. }
            | Self::Sum { column }
            | Self::Avg { column }
            | Self::Max { column }
            | Self::Min { column }
            | Self::GroupConcat { column, .. } => column,
        }
    }
}

fn count_to_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn sum(column: &str, values: &[&Value]) -> Result<Value> {
    let invalid = |message: String| ModelError::InvalidValue {
        attribute: column.to_string(),
        message,
    };
    let mut total = Value::Null;
    for value in values {
        total = match (total, *value) {
            (Value::Null, Value::Int(n)) => Value::Int(*n),
            (Value::Null, Value::Float(n)) => Value::Float(*n),
            (Value::Int(a), Value::Int(b)) => Value::Int(
                a.checked_add(*b)
                    .ok_or_else(|| invalid("integer overflow".to_string()))?,
            ),
            (acc, value) => match (acc.as_f64(), value.as_f64()) {
                (Some(a), Some(b)) => Value::Float(a + b),
                _ => return Err(invalid(format!("cannot sum a {} value", value.kind()))),
            },
        };
    }
    Ok(total)
}

fn extreme(values: &[&Value], wanted: Ordering) -> Value {
    values
        .iter()
        .copied()
        .reduce(|best, v| if v.sort_cmp(best) == wanted { v } else { best })
        .cloned()
        .unwrap_or(Value::Null)
}

fn concat_text(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
        other => other.to_json().to_string(),
    }
}
