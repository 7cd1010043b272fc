//! Find options and the in-memory select pipeline.
//!
//! [`select`] runs the same steps a SQL `SELECT` would: filter, sort,
//! offset, limit, then project the selected attributes.

use std::cmp::Ordering;

use oxide_where_core::{Matcher, Predicate, Record, Value};
use tracing::debug;

use crate::error::Result;

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

/// An ordering specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Column to order by
    pub column: String,
    /// Order direction
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Creates a new ascending order specification.
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Asc,
        }
    }

    /// Creates a new descending order specification.
    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Desc,
        }
    }

    /// Parses an order specification.
    ///
    /// Prefix with `-` for descending order.
    /// Example: `"-createdAt"` for descending, `"name"` for ascending.
    pub fn parse(spec: &str) -> Self {
        if let Some(column) = spec.strip_prefix('-') {
            Self::desc(column)
        } else {
            Self::asc(spec)
        }
    }

    fn compare_rows(&self, a: &Record, b: &Record) -> Ordering {
        let left = a.get(&self.column).unwrap_or(&Value::Null);
        let right = b.get(&self.column).unwrap_or(&Value::Null);
        let ordering = left.sort_cmp(right);
        match self.direction {
            OrderDirection::Asc => ordering,
            OrderDirection::Desc => ordering.reverse(),
        }
    }
}

/// One selected attribute, optionally renamed in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    /// Stored attribute to read.
    pub source: String,
    /// Name in the output row.
    pub alias: String,
}

impl Projection {
    /// Selects an attribute under its own name.
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            alias: source.to_string(),
        }
    }

    /// Selects an attribute under another name.
    pub fn renamed(source: &str, alias: &str) -> Self {
        Self {
            source: source.to_string(),
            alias: alias.to_string(),
        }
    }
}

/// Which attributes a query returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Attributes {
    /// Every stored attribute.
    #[default]
    All,
    /// Only these, in this order.
    Include(Vec<Projection>),
    /// Everything except these.
    Exclude(Vec<String>),
}

impl Attributes {
    fn project(&self, row: &Record) -> Record {
        match self {
            Self::All => row.clone(),
            Self::Include(projections) => projections
                .iter()
                .map(|p| {
                    let value = row.get(&p.source).cloned().unwrap_or(Value::Null);
                    (p.alias.clone(), value)
                })
                .collect(),
            Self::Exclude(names) => row
                .iter()
                .filter(|(name, _)| !names.iter().any(|n| n == *name))
                .map(|(name, value)| (name, value.clone()))
                .collect(),
        }
    }
}

/// Options for finding rows.
///
/// # Example
///
/// ```
/// use oxide_where_core::Predicate;
/// use oxide_where_model::FindOptions;
///
/// let options = FindOptions::new()
///     .filter(Predicate::like("title", "sd%"))
///     .order_by("-id")
///     .offset(10)
///     .limit(2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Rows must satisfy this predicate; `None` matches every row.
    pub filter: Option<Predicate>,
    /// Selected attributes.
    pub attributes: Attributes,
    /// Ordering, most significant first.
    pub order: Vec<OrderBy>,
    /// Maximum number of rows.
    pub limit: Option<usize>,
    /// Rows to skip after sorting.
    pub offset: Option<usize>,
}

impl FindOptions {
    /// Creates options matching every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter. Multiple filters are combined with AND.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Adds an ordering. Use a `-` prefix for descending order.
    #[must_use]
    pub fn order_by(mut self, spec: &str) -> Self {
        self.order.push(OrderBy::parse(spec));
        self
    }

    /// Limits the number of results.
    #[must_use]
    pub const fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Sets the offset for pagination.
    #[must_use]
    pub const fn offset(mut self, n: usize) -> Self {
        self.offset = Some(n);
        self
    }

    /// Selects only these attributes.
    #[must_use]
    pub fn include(mut self, names: &[&str]) -> Self {
        self.attributes = Attributes::Include(names.iter().map(|n| Projection::new(n)).collect());
        self
    }

    /// Adds a renamed attribute to the selection.
    #[must_use]
    pub fn rename(mut self, source: &str, alias: &str) -> Self {
        let projection = Projection::renamed(source, alias);
        match &mut self.attributes {
            Attributes::Include(projections) => projections.push(projection),
            _ => self.attributes = Attributes::Include(vec![projection]),
        }
        self
    }

    /// Selects every attribute except these.
    #[must_use]
    pub fn exclude(mut self, names: &[&str]) -> Self {
        self.attributes = Attributes::Exclude(names.iter().map(ToString::to_string).collect());
        self
    }
}

/// Runs `options` over `rows`.
///
/// Sorting is stable, so rows that compare equal keep their input order.
///
/// # Errors
///
/// Fails if evaluating the filter fails for any row.
pub fn select<'a, I>(rows: I, options: &FindOptions, matcher: &Matcher) -> Result<Vec<Record>>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut selected = filter_rows(rows, options.filter.as_ref(), matcher)?;
    if !options.order.is_empty() {
        selected.sort_by(|a, b| {
            options
                .order
                .iter()
                .map(|order| order.compare_rows(a, b))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });
    }
    let matched = selected.len();
    let rows: Vec<Record> = selected
        .into_iter()
        .skip(options.offset.unwrap_or(0))
        .take(options.limit.unwrap_or(usize::MAX))
        .map(|row| options.attributes.project(row))
        .collect();
    debug!(matched, returned = rows.len(), "select");
    Ok(rows)
}

/// Counts the rows satisfying `filter`.
///
/// # Errors
///
/// Fails if evaluating the filter fails for any row.
pub fn count_matching<'a, I>(rows: I, filter: Option<&Predicate>, matcher: &Matcher) -> Result<usize>
where
    I: IntoIterator<Item = &'a Record>,
{
    Ok(filter_rows(rows, filter, matcher)?.len())
}

pub(crate) fn filter_rows<'a, I>(
    rows: I,
    filter: Option<&Predicate>,
    matcher: &Matcher,
) -> Result<Vec<&'a Record>>
where
    I: IntoIterator<Item = &'a Record>,
{
    match filter {
        Some(predicate) => Ok(matcher.filter(rows, predicate)?),
        None => Ok(rows.into_iter().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Record> {
        vec![
            Record::new().with("id", 1).with("name", "b").with("age", 30),
            Record::new().with("id", 2).with("name", "a").with("age", 20),
            Record::new().with("id", 3).with("name", "c").with("age", 30),
            Record::new().with("id", 4).with("name", "d"),
        ]
    }

    fn ids(rows: &[Record]) -> Vec<i64> {
        rows.iter()
            .filter_map(|r| match r.get("id") {
                Some(Value::Int(id)) => Some(*id),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_order_by_parse() {
        assert_eq!(
            OrderBy::parse("-createdAt").direction,
            OrderDirection::Desc
        );
        assert_eq!(OrderBy::parse("name").direction, OrderDirection::Asc);
        assert_eq!(OrderBy::parse("-createdAt").column, "createdAt");
    }

    #[test]
    fn test_select_all() {
        let rows = rows();
        let out = select(&rows, &FindOptions::new(), &Matcher::default()).unwrap();
        assert_eq!(out, rows);
    }

    #[test]
    fn test_filter_then_order() {
        let rows = rows();
        let options = FindOptions::new()
            .filter(Predicate::gte("age", 20))
            .order_by("-age")
            .order_by("name");
        let out = select(&rows, &options, &Matcher::default()).unwrap();
        assert_eq!(ids(&out), vec![1, 3, 2]);
    }

    #[test]
    fn test_nulls_sort_first() {
        let rows = rows();
        let out = select(&rows, &FindOptions::new().order_by("age"), &Matcher::default()).unwrap();
        assert_eq!(ids(&out), vec![4, 2, 1, 3]);
    }

    #[test]
    fn test_offset_and_limit() {
        let rows = rows();
        let options = FindOptions::new().order_by("id").offset(1).limit(2);
        let out = select(&rows, &options, &Matcher::default()).unwrap();
        assert_eq!(ids(&out), vec![2, 3]);

        let past_end = FindOptions::new().offset(10);
        assert!(select(&rows, &past_end, &Matcher::default()).unwrap().is_empty());
    }

    #[test]
    fn test_repeated_filters_are_anded() {
        let rows = rows();
        let options = FindOptions::new()
            .filter(Predicate::eq("age", 30))
            .filter(Predicate::ne("name", "b"));
        let out = select(&rows, &options, &Matcher::default()).unwrap();
        assert_eq!(ids(&out), vec![3]);
    }

    #[test]
    fn test_include_and_rename() {
        let rows = rows();
        let options = FindOptions::new()
            .include(&["id"])
            .rename("name", "label")
            .filter(Predicate::eq("id", 2));
        let out = select(&rows, &options, &Matcher::default()).unwrap();
        assert_eq!(out, vec![Record::new().with("id", 2).with("label", "a")]);
    }

    #[test]
    fn test_exclude() {
        let rows = rows();
        let options = FindOptions::new().exclude(&["age", "name"]).limit(1);
        let out = select(&rows, &options, &Matcher::default()).unwrap();
        assert_eq!(out, vec![Record::new().with("id", 1)]);
    }

    #[test]
    fn test_count_matching() {
        let rows = rows();
        let matcher = Matcher::default();
        assert_eq!(count_matching(&rows, None, &matcher).unwrap(), 4);
        assert_eq!(
            count_matching(&rows, Some(&Predicate::is_null("age")), &matcher).unwrap(),
            1
        );
    }

    #[test]
    fn test_filter_error_propagates() {
        let rows = rows();
        let options = FindOptions::new().filter(Predicate::lt("name", 3));
        assert!(select(&rows, &options, &Matcher::default()).is_err());
    }
}
