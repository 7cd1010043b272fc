//! Parsing of ORM-style where-objects into predicates.
//!
//! Where-objects are JSON objects whose keys are either field names or
//! `$`-prefixed operators:
//!
//! ```json
//! {
//!   "rand": { "$or": { "$lt": 1000, "$eq": null } },
//!   "$or": {
//!     "title": { "$like": "Boat%" },
//!     "description": { "$like": "%boat%" }
//!   }
//! }
//! ```
//!
//! Entries of an object are combined with AND. A bare scalar means `eq`
//! (`null` means `isNull`) and a bare array means `in`.

use serde_json::{Map, Value as Json};
use tracing::debug;

use crate::error::{Result, WhereError};
use crate::predicate::{Comparison, OperandShape, Operand, Operator, Predicate};
use crate::value::Value;

/// Parses a where-object into a predicate.
///
/// # Example
///
/// ```
/// use oxide_where_core::{matches, parse_where, Record};
/// use serde_json::json;
///
/// let predicate = parse_where(&json!({
///     "name": "Some Project",
///     "$not": { "$or": { "id": [1, 2, 3], "description": { "$like": "Hello%" } } }
/// }))
/// .unwrap();
///
/// let record = Record::new()
///     .with("id", 5)
///     .with("name", "Some Project")
///     .with("description", "World Hello.");
/// assert!(matches(&record, &predicate).unwrap());
/// ```
///
/// # Errors
///
/// Returns [`WhereError::UnknownOperator`] for an unrecognized `$` key and
/// [`WhereError::InvalidWhere`] or [`WhereError::InvalidOperand`] for a
/// malformed shape.
pub fn parse(json: &Json) -> Result<Predicate> {
    let predicate = match json {
        Json::Object(map) => conjunction(parse_conditions(map)?),
        Json::Array(items) => conjunction(
            items
                .iter()
                .map(parse)
                .collect::<Result<Vec<_>>>()?,
        ),
        other => {
            return Err(WhereError::InvalidWhere(format!(
                "expected an object, got {other}"
            )));
        }
    };
    debug!(%predicate, "parsed where clause");
    Ok(predicate)
}

impl TryFrom<&Json> for Predicate {
    type Error = WhereError;

    fn try_from(json: &Json) -> Result<Self> {
        parse(json)
    }
}

fn conjunction(mut terms: Vec<Predicate>) -> Predicate {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        Predicate::And(terms)
    }
}

fn disjunction(mut terms: Vec<Predicate>) -> Predicate {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        Predicate::Or(terms)
    }
}

/// Parses the entries of an object, one term per entry.
fn parse_conditions(map: &Map<String, Json>) -> Result<Vec<Predicate>> {
    let mut terms = Vec::with_capacity(map.len());
    for (key, value) in map {
        let term = match key.strip_prefix('$') {
            Some("and") => conjunction(parse_group(value)?),
            Some("or") => disjunction(parse_group(value)?),
            Some("not") => conjunction(parse_group(value)?).not(),
            Some(tag) => {
                let op: Operator = tag.parse()?;
                return Err(WhereError::InvalidWhere(format!(
                    "operator ${op} must be nested under a field"
                )));
            }
            None => parse_field(key, value)?,
        };
        terms.push(term);
    }
    Ok(terms)
}

/// Parses the operand of `$and`/`$or`/`$not` outside a field scope.
fn parse_group(value: &Json) -> Result<Vec<Predicate>> {
    match value {
        Json::Object(map) => parse_conditions(map),
        Json::Array(items) => items.iter().map(parse).collect(),
        other => Err(WhereError::InvalidWhere(format!(
            "expected an object or array of conditions, got {other}"
        ))),
    }
}

fn parse_field(field: &str, value: &Json) -> Result<Predicate> {
    match value {
        Json::Object(map) => Ok(conjunction(parse_field_operators(field, map)?)),
        Json::Array(_) => comparison(field, Operator::In, value),
        Json::Null => Ok(Predicate::is_null(field)),
        scalar => comparison(field, Operator::Eq, scalar),
    }
}

/// Parses an operator map scoped to one field.
fn parse_field_operators(field: &str, map: &Map<String, Json>) -> Result<Vec<Predicate>> {
    let mut terms = Vec::with_capacity(map.len());
    for (key, operand) in map {
        let Some(tag) = key.strip_prefix('$') else {
            return Err(WhereError::InvalidWhere(format!(
                "expected an operator under field {field}, got {key}"
            )));
        };
        let term = match tag {
            "and" => conjunction(parse_field_group(field, operand)?),
            "or" => disjunction(parse_field_group(field, operand)?),
            "not" => parse_field(field, operand)?.not(),
            tag => comparison(field, tag.parse()?, operand)?,
        };
        terms.push(term);
    }
    Ok(terms)
}

fn parse_field_group(field: &str, operand: &Json) -> Result<Vec<Predicate>> {
    match operand {
        Json::Object(map) => parse_field_operators(field, map),
        Json::Array(items) => items.iter().map(|item| parse_field(field, item)).collect(),
        other => Err(WhereError::InvalidWhere(format!(
            "expected an operator map or array under field {field}, got {other}"
        ))),
    }
}

fn comparison(field: &str, op: Operator, operand: &Json) -> Result<Predicate> {
    let invalid = |expected| WhereError::InvalidOperand {
        operator: op.tag().to_string(),
        expected,
    };
    let operand = match op.operand_shape() {
        OperandShape::None => {
            // `{"$isNull": false}` reads naturally as "is not null".
            return Ok(match (op, operand) {
                (Operator::IsNull, Json::Bool(false)) => Predicate::not_null(field),
                (Operator::NotNull, Json::Bool(false)) => Predicate::is_null(field),
                _ => Comparison::new(field, op, Operand::None).into(),
            });
        }
        OperandShape::Single | OperandShape::Pattern => {
            if operand.is_array() || operand.is_object() {
                return Err(invalid("a single value"));
            }
            if op.operand_shape() == OperandShape::Pattern {
                Operand::Value(Value::from_json(operand)?)
            } else {
                Operand::Value(Value::from_json_inferring_dates(operand)?)
            }
        }
        OperandShape::List => {
            let items = operand.as_array().ok_or_else(|| invalid("an array"))?;
            Operand::List(
                items
                    .iter()
                    .map(Value::from_json_inferring_dates)
                    .collect::<Result<Vec<_>>>()?,
            )
        }
    };
    Ok(Comparison::new(field, op, operand).into())
}
