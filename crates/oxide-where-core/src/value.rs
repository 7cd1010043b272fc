//! Scalar values stored in records and used as predicate operands.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, WhereError};

/// A scalar field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Timestamp value, always UTC.
    Date(DateTime<Utc>),
}

/// The kind of a [`Value`], used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// NULL.
    Null,
    /// Boolean.
    Bool,
    /// Integer or float.
    Number,
    /// Text.
    Text,
    /// Timestamp.
    Date,
    /// A list operand.
    List,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::Text => "text",
            Self::Date => "date",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Returns the kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) | Self::Float(_) => ValueKind::Number,
            Self::Text(_) => ValueKind::Text,
            Self::Date(_) => ValueKind::Date,
        }
    }

    /// Returns whether this value is NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text content, if this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric content as a float, if this is a number.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Type-aware equality.
    ///
    /// Integers and floats compare numerically, NULL equals only NULL and
    /// values of different kinds are never equal. Text holding an RFC 3339
    /// timestamp equals a date at the same instant.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            _ => self.compare(other) == Some(Ordering::Equal),
        }
    }

    /// Ordering used by the `lt`/`lte`/`gt`/`gte` operators.
    ///
    /// Only numbers and dates are ordered; any other pairing returns `None`.
    /// Mixed integer and float pairs compare exactly. Text is ordered against
    /// a date only when it parses as an RFC 3339 timestamp.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => Some(a.total_cmp(b)),
            (Self::Int(a), Self::Float(b)) => cmp_int_float(*a, *b),
            (Self::Float(a), Self::Int(b)) => cmp_int_float(*b, *a).map(Ordering::reverse),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Text(b)) => parse_timestamp(b).map(|b| a.cmp(&b)),
            (Self::Text(a), Self::Date(b)) => parse_timestamp(a).map(|a| a.cmp(b)),
            _ => None,
        }
    }

    /// Total order used for sorting result sets.
    ///
    /// NULL sorts first, then booleans, numbers, text and dates.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        const fn rank(value: &Value) -> u8 {
            match value {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Int(_) | Value::Float(_) => 2,
                Value::Text(_) => 3,
                Value::Date(_) => 4,
            }
        }

        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            // NaN is the only number `compare` leaves unordered; it sorts last.
            (Self::Int(_), Self::Float(_)) => self.compare(other).unwrap_or(Ordering::Less),
            (Self::Float(_), Self::Int(_)) => self.compare(other).unwrap_or(Ordering::Greater),
            _ => match rank(self).cmp(&rank(other)) {
                Ordering::Equal => self.compare(other).unwrap_or(Ordering::Equal),
                unequal => unequal,
            },
        }
    }

    /// Converts a JSON scalar into a value.
    ///
    /// Strings always stay [`Value::Text`], so a record read from JSON writes
    /// back unchanged. See [`Value::from_json_inferring_dates`] for operands.
    ///
    /// # Errors
    ///
    /// Returns [`WhereError::InvalidValue`] for arrays and objects.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(b) => Ok(Self::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .ok_or_else(|| WhereError::InvalidValue(format!("unsupported number {n}"))),
            serde_json::Value::String(s) => Ok(Self::Text(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(
                WhereError::InvalidValue(format!("expected a scalar, got {json}")),
            ),
        }
    }

    /// Like [`Value::from_json`], but strings holding an RFC 3339 timestamp
    /// become [`Value::Date`].
    ///
    /// # Errors
    ///
    /// Returns [`WhereError::InvalidValue`] for arrays and objects.
    pub fn from_json_inferring_dates(json: &serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::String(s) => {
                Ok(parse_timestamp(s).map_or_else(|| Self::Text(s.clone()), Self::Date))
            }
            other => Self::from_json(other),
        }
    }

    /// Converts this value to JSON. Dates render as RFC 3339 strings.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Date(d) => {
                serde_json::Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        }
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Orders an integer against a float without rounding the integer.
#[allow(clippy::cast_possible_truncation)]
fn cmp_int_float(i: i64, f: f64) -> Option<Ordering> {
    // 2^63, the first float above every i64.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return None;
    }
    if f >= LIMIT {
        return Some(Ordering::Less);
    }
    if f < -LIMIT {
        return Some(Ordering::Greater);
    }
    let whole = f.trunc();
    Some(i.cmp(&(whole as i64)).then_with(|| {
        if f > whole {
            Ordering::Less
        } else if f < whole {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(true) => f.write_str("TRUE"),
            Self::Bool(false) => f.write_str("FALSE"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Date(d) => write!(f, "'{}'", d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Date(d) => {
                serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(&json).map_err(serde::de::Error::custom)
    }
}

/// Trait for types that can be converted to values.
pub trait IntoValue {
    /// Converts into a [`Value`].
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl IntoValue for i16 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl IntoValue for u32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl IntoValue for u16 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl IntoValue for u8 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(String::from(self))
    }
}

impl IntoValue for DateTime<Utc> {
    fn into_value(self) -> Value {
        Value::Date(self)
    }
}

impl IntoValue for NaiveDate {
    fn into_value(self) -> Value {
        Value::Date(self.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_equals_numeric_across_int_and_float() {
        assert!(Value::Int(2).equals(&Value::Float(2.0)));
        assert!(!Value::Int(2).equals(&Value::Float(2.5)));
    }

    #[test]
    fn test_equals_null_only_null() {
        assert!(Value::Null.equals(&Value::Null));
        assert!(!Value::Null.equals(&Value::Int(0)));
        assert!(!Value::Text(String::new()).equals(&Value::Null));
    }

    #[test]
    fn test_equals_different_kinds() {
        assert!(!Value::Text("1".to_string()).equals(&Value::Int(1)));
        assert!(!Value::Bool(true).equals(&Value::Int(1)));
    }

    #[test]
    fn test_compare_numbers_and_dates() {
        assert_eq!(Value::Int(1).compare(&Value::Int(2)), Some(Ordering::Less));
        assert_eq!(
            Value::Float(2.5).compare(&Value::Int(2)),
            Some(Ordering::Greater)
        );
        let earlier = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            Value::Date(earlier).compare(&Value::Date(later)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_compare_rejects_text_and_mixed_kinds() {
        assert_eq!(
            Value::Text("a".to_string()).compare(&Value::Text("b".to_string())),
            None
        );
        assert_eq!(Value::Text("a".to_string()).compare(&Value::Int(1)), None);
        assert_eq!(
            Value::Int(1).compare(&Value::Date(Utc::now())),
            None
        );
    }

    #[test]
    fn test_sort_cmp_ranks_kinds() {
        let mut values = vec![
            Value::Text("b".to_string()),
            Value::Int(3),
            Value::Null,
            Value::Float(1.5),
            Value::Text("a".to_string()),
            Value::Bool(true),
        ];
        values.sort_by(Value::sort_cmp);
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Bool(true),
                Value::Float(1.5),
                Value::Int(3),
                Value::Text("a".to_string()),
                Value::Text("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(Value::from_json(&json!(null)).unwrap(), Value::Null);
        assert_eq!(Value::from_json(&json!(900)).unwrap(), Value::Int(900));
        assert_eq!(Value::from_json(&json!(1.25)).unwrap(), Value::Float(1.25));
        assert_eq!(
            Value::from_json(&json!("Boat-abc")).unwrap(),
            Value::Text("Boat-abc".to_string())
        );
    }

    #[test]
    fn test_from_json_keeps_timestamp_text() {
        let value = Value::from_json(&json!("2020-05-01T08:00:00+08:00")).unwrap();
        assert_eq!(value, Value::Text("2020-05-01T08:00:00+08:00".to_string()));
        assert_eq!(value.to_json(), json!("2020-05-01T08:00:00+08:00"));
    }

    #[test]
    fn test_from_json_inferring_dates() {
        let value = Value::from_json_inferring_dates(&json!("2020-05-01T08:00:00+08:00")).unwrap();
        assert_eq!(
            value,
            Value::Date(Utc.with_ymd_and_hms(2020, 5, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            Value::from_json_inferring_dates(&json!("2020-05-01")).unwrap(),
            Value::Text("2020-05-01".to_string())
        );
        assert_eq!(
            Value::from_json_inferring_dates(&json!(7)).unwrap(),
            Value::Int(7)
        );
    }

    #[test]
    fn test_timestamp_text_against_dates() {
        let date = Value::Date(Utc.with_ymd_and_hms(2020, 5, 1, 0, 0, 0).unwrap());
        let same_instant = Value::Text("2020-05-01T08:00:00+08:00".to_string());
        assert!(same_instant.equals(&date));
        assert!(date.equals(&same_instant));
        assert_eq!(
            Value::Text("2019-12-31T23:59:59Z".to_string()).compare(&date),
            Some(Ordering::Less)
        );
        assert_eq!(
            date.compare(&Value::Text("2999-01-01T00:00:00Z".to_string())),
            Some(Ordering::Less)
        );

        let not_a_timestamp = Value::Text("May 1st".to_string());
        assert!(!not_a_timestamp.equals(&date));
        assert_eq!(not_a_timestamp.compare(&date), None);
        assert_eq!(
            same_instant.compare(&Value::Text("2020-05-01T00:00:00Z".to_string())),
            None
        );
    }

    #[test]
    fn test_int_float_compare_exactly_beyond_f64_precision() {
        // 2^53 + 1 has no f64 representation; it rounds to 2^53.
        let int = Value::Int(9_007_199_254_740_993);
        let float = Value::Float(9_007_199_254_740_992.0);
        assert!(!int.equals(&float));
        assert!(!float.equals(&int));
        assert_eq!(int.compare(&float), Some(Ordering::Greater));
        assert_eq!(float.compare(&int), Some(Ordering::Less));
        assert!(Value::Int(9_007_199_254_740_992).equals(&float));

        assert_eq!(
            Value::Int(i64::MAX).compare(&Value::Float(9.223_372_036_854_775_808e18)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Int(i64::MIN).compare(&Value::Float(-1e19)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Int(-1).compare(&Value::Float(-1.5)), Some(Ordering::Greater));
        assert_eq!(Value::Int(0).compare(&Value::Float(-0.5)), Some(Ordering::Greater));
        assert_eq!(Value::Int(1).compare(&Value::Float(f64::NAN)), None);
        assert!(!Value::Int(1).equals(&Value::Float(f64::NAN)));
    }

    #[test]
    fn test_sort_cmp_is_consistent_for_mixed_numbers() {
        let mut values = vec![
            Value::Float(f64::NAN),
            Value::Int(9_007_199_254_740_993),
            Value::Float(9_007_199_254_740_992.0),
            Value::Int(9_007_199_254_740_992),
        ];
        values.sort_by(Value::sort_cmp);
        assert_eq!(values[1], Value::Int(9_007_199_254_740_992));
        assert_eq!(values[2], Value::Int(9_007_199_254_740_993));
        assert!(matches!(values[3], Value::Float(f) if f.is_nan()));
    }

    #[test]
    fn test_from_json_rejects_containers() {
        assert!(matches!(
            Value::from_json(&json!([1, 2])),
            Err(WhereError::InvalidValue(_))
        ));
        assert!(Value::from_json(&json!({"a": 1})).is_err());
    }

    #[test]
    fn test_display_escapes_text() {
        assert_eq!(Value::Text("it's".to_string()).to_string(), "'it''s'");
        assert_eq!(Value::Null.to_string(), "NULL");
    }

    #[test]
    fn test_into_value_conversions() {
        assert_eq!(true.into_value(), Value::Bool(true));
        assert_eq!(42_i32.into_value(), Value::Int(42));
        assert_eq!("hello".into_value(), Value::Text("hello".to_string()));
        assert_eq!(None::<i32>.into_value(), Value::Null);
        assert_eq!(
            NaiveDate::from_ymd_opt(2020, 1, 2).unwrap().into_value(),
            Value::Date(Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap())
        );
    }
}
