//! In-memory storage for the rows of one model.
//!
//! A [`Collection`] plays the part of a table: it assigns primary keys,
//! maintains timestamps, enforces validators and unique keys, and answers
//! finder queries through a [`Matcher`].

use std::sync::Arc;

use chrono::Utc;
use oxide_where_core::{
    IntoValue, MatchOptions, Matcher, Operand, Operator, Predicate, Record, Value,
};
use tracing::debug;

use crate::aggregate::Aggregate;
use crate::error::{ModelError, Result};
use crate::instance::Instance;
use crate::model::{ModelDefinition, CREATED_AT, UPDATED_AT};
use crate::query::{self, FindOptions};

/// Result of [`Collection::find_and_count_all`].
#[derive(Debug, Clone)]
pub struct CountedRows {
    /// Number of matching rows, ignoring limit and offset.
    pub count: usize,
    /// The requested page of rows.
    pub rows: Vec<Instance>,
}

/// The stored rows of one model.
///
/// # Example
///
/// ```
/// use oxide_where_core::{Predicate, Record};
/// use oxide_where_model::{Attribute, Collection, FindOptions, ModelDefinition};
///
/// let project = ModelDefinition::define("Project")
///     .attribute(Attribute::text("title"))
///     .finish();
/// let mut projects = Collection::new(project);
///
/// projects.create(Record::new().with("title", "sdf")).unwrap();
/// projects.create(Record::new().with("title", "other")).unwrap();
///
/// let found = projects
///     .find_all(&FindOptions::new().filter(Predicate::like("title", "sd%")))
///     .unwrap();
/// assert_eq!(found.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Collection {
    model: Arc<ModelDefinition>,
    rows: Vec<Record>,
    next_id: i64,
    matcher: Matcher,
}

impl Collection {
    /// Creates an empty collection with case-sensitive `LIKE`.
    pub fn new(model: Arc<ModelDefinition>) -> Self {
        Self::with_options(model, MatchOptions::default())
    }

    /// Creates an empty collection with the given match options.
    pub fn with_options(model: Arc<ModelDefinition>, options: MatchOptions) -> Self {
        Self {
            model,
            rows: Vec::new(),
            next_id: 1,
            matcher: Matcher::new(options),
        }
    }

    /// Returns the model definition.
    pub const fn model(&self) -> &Arc<ModelDefinition> {
        &self.model
    }

    /// Returns the matcher used by finders.
    pub const fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Returns the stored rows in insertion order.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Returns the number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Builds an unsaved instance.
    ///
    /// # Errors
    ///
    /// See [`ModelDefinition::build`].
    pub fn build(&self, values: Record) -> Result<Instance> {
        self.model.build(values)
    }

    /// Builds, validates and stores an instance.
    ///
    /// # Errors
    ///
    /// Fails on unknown attributes, validation failures and unique key
    /// violations; nothing is stored in that case.
    pub fn create(&mut self, values: Record) -> Result<Instance> {
        let mut instance = self.build(values)?;
        self.save(&mut instance)?;
        Ok(instance)
    }

    /// Creates several instances. Either all are stored or none are.
    ///
    /// # Errors
    ///
    /// Returns the first failure; the collection is left unchanged.
    pub fn bulk_create(&mut self, values: Vec<Record>) -> Result<Vec<Instance>> {
        let rows_before = self.rows.len();
        let next_id_before = self.next_id;
        let mut created = Vec::with_capacity(values.len());
        for record in values {
            match self.create(record) {
                Ok(instance) => created.push(instance),
                Err(err) => {
                    self.rows.truncate(rows_before);
                    self.next_id = next_id_before;
                    return Err(err);
                }
            }
        }
        debug!(model = self.model.name(), count = created.len(), "bulk_create");
        Ok(created)
    }

    /// Stores an instance: inserts it if new, otherwise replaces the stored
    /// row with the same primary key.
    ///
    /// # Errors
    ///
    /// Fails on validation errors and unique key violations, and with
    /// [`ModelError::NotFound`] when an existing instance's row is gone.
    pub fn save(&mut self, instance: &mut Instance) -> Result<()> {
        let now = Value::Date(Utc::now());
        let pk_name = self.model.primary_key().to_string();
        let timestamps = self.model.timestamps();

        if instance.is_new_record() {
            if instance.pk().is_null() && self.model.auto_increment() {
                instance.set_data_value(&pk_name, self.next_id);
            }
            if timestamps {
                if instance.get_data_value(CREATED_AT).map_or(true, Value::is_null) {
                    instance.set_data_value(CREATED_AT, now.clone());
                }
                instance.set_data_value(UPDATED_AT, now);
            }
            instance.validate()?;
            self.check_unique(instance.data(), None)?;
            if let Value::Int(id) = instance.pk() {
                self.next_id = self.next_id.max(id.saturating_add(1));
            }
            self.rows.push(instance.data().clone());
            instance.mark_stored();
            debug!(model = self.model.name(), pk = %instance.pk(), "insert");
        } else {
            let index = self.position(&instance.pk()).ok_or(ModelError::NotFound)?;
            if timestamps {
                instance.set_data_value(UPDATED_AT, now);
            }
            instance.validate()?;
            self.check_unique(instance.data(), Some(index))?;
            self.rows[index] = instance.data().clone();
            debug!(model = self.model.name(), pk = %instance.pk(), "update");
        }
        Ok(())
    }

    /// Looks up a row by primary key.
    pub fn find_by_pk<V: IntoValue>(&self, pk: V) -> Option<Instance> {
        let pk = pk.into_value();
        self.position(&pk)
            .map(|index| self.model.restore(self.rows[index].clone()))
    }

    /// Returns the rows selected by `options`.
    ///
    /// # Errors
    ///
    /// Fails if evaluating the filter fails.
    pub fn find_all(&self, options: &FindOptions) -> Result<Vec<Instance>> {
        let rows = query::select(&self.rows, options, &self.matcher)?;
        debug!(model = self.model.name(), found = rows.len(), "find_all");
        Ok(rows.into_iter().map(|row| self.model.restore(row)).collect())
    }

    /// Returns the first row selected by `options`.
    ///
    /// # Errors
    ///
    /// Fails if evaluating the filter fails.
    pub fn find_one(&self, options: &FindOptions) -> Result<Option<Instance>> {
        let options = options.clone().limit(1);
        Ok(self.find_all(&options)?.into_iter().next())
    }

    /// Counts the rows satisfying `filter`, or all rows.
    ///
    /// # Errors
    ///
    /// Fails if evaluating the filter fails.
    pub fn count(&self, filter: Option<&Predicate>) -> Result<usize> {
        query::count_matching(&self.rows, filter, &self.matcher)
    }

    /// Returns a page of rows plus the total number of matches.
    ///
    /// # Errors
    ///
    /// Fails if evaluating the filter fails.
    pub fn find_and_count_all(&self, options: &FindOptions) -> Result<CountedRows> {
        let count = self.count(options.filter.as_ref())?;
        let rows = self.find_all(options)?;
        Ok(CountedRows { count, rows })
    }

    /// Finds a row matching `filter`, or creates one.
    ///
    /// A created row takes `defaults`, overridden by the equalities that
    /// `filter` requires (`field = value` terms joined by AND). Returns the
    /// instance and whether it was created.
    ///
    /// # Errors
    ///
    /// Fails if the lookup or the creation fails.
    pub fn find_or_create(
        &mut self,
        filter: &Predicate,
        defaults: Record,
    ) -> Result<(Instance, bool)> {
        let options = FindOptions::new().filter(filter.clone());
        if let Some(found) = self.find_one(&options)? {
            return Ok((found, false));
        }
        let mut values = defaults;
        collect_equalities(filter, &mut values);
        let created = self.create(values)?;
        Ok((created, true))
    }

    /// Sets `values` on every row satisfying `filter`. Setters run, and the
    /// update is applied to all rows or none.
    ///
    /// # Errors
    ///
    /// Fails on unknown attributes, validation failures and unique key
    /// violations.
    pub fn update(&mut self, values: &Record, filter: Option<&Predicate>) -> Result<usize> {
        let updated = self.modify(filter, |instance| {
            for (name, value) in values.iter() {
                instance.set(name, value.clone())?;
            }
            Ok(())
        })?;
        debug!(model = self.model.name(), updated, "update");
        Ok(updated)
    }

    /// Adds `by` to each listed numeric field of every row satisfying
    /// `filter`.
    ///
    /// # Errors
    ///
    /// Fails if a field is unknown or not numeric.
    pub fn increment(&mut self, fields: &[(&str, i64)], filter: Option<&Predicate>) -> Result<usize> {
        self.modify(filter, |instance| {
            for (name, by) in fields {
                instance.increment(name, *by)?;
            }
            Ok(())
        })
    }

    /// Removes every row satisfying `filter`, or all rows.
    ///
    /// # Errors
    ///
    /// Fails if evaluating the filter fails; nothing is removed then.
    pub fn destroy(&mut self, filter: Option<&Predicate>) -> Result<usize> {
        let doomed = self.matching_indexes(filter)?;
        let mut index = 0;
        self.rows.retain(|_| {
            let keep = doomed.binary_search(&index).is_err();
            index += 1;
            keep
        });
        debug!(model = self.model.name(), destroyed = doomed.len(), "destroy");
        Ok(doomed.len())
    }

    /// Removes all rows. Primary keys keep counting from where they were.
    pub fn truncate(&mut self) {
        self.rows.clear();
    }

    /// Computes an aggregate over the rows satisfying `filter`.
    ///
    /// # Errors
    ///
    /// Fails if evaluating the filter or the aggregate fails.
    pub fn aggregate(&self, aggregate: &Aggregate, filter: Option<&Predicate>) -> Result<Value> {
        let rows = query::filter_rows(&self.rows, filter, &self.matcher)?;
        aggregate.compute(rows)
    }

    fn position(&self, pk: &Value) -> Option<usize> {
        if pk.is_null() {
            return None;
        }
        let pk_name = self.model.primary_key();
        self.rows
            .iter()
            .position(|row| row.get(pk_name).is_some_and(|v| v.equals(pk)))
    }

    fn matching_indexes(&self, filter: Option<&Predicate>) -> Result<Vec<usize>> {
        let mut indexes = Vec::new();
        for (index, row) in self.rows.iter().enumerate() {
            let keep = match filter {
                Some(predicate) => self.matcher.matches(row, predicate)?,
                None => true,
            };
            if keep {
                indexes.push(index);
            }
        }
        Ok(indexes)
    }

    fn modify<F>(&mut self, filter: Option<&Predicate>, change: F) -> Result<usize>
    where
        F: Fn(&mut Instance) -> Result<()>,
    {
        let indexes = self.matching_indexes(filter)?;
        let now = Value::Date(Utc::now());
        let mut changed = Vec::with_capacity(indexes.len());
        for &index in &indexes {
            let mut instance = self.model.restore(self.rows[index].clone());
            change(&mut instance)?;
            if self.model.timestamps() {
                instance.set_data_value(UPDATED_AT, now.clone());
            }
            instance.validate()?;
            changed.push((index, instance.into_data()));
        }

        let mut next = self.rows.clone();
        for (index, row) in &changed {
            next[*index] = row.clone();
        }
        for (index, row) in &changed {
            check_unique(&self.model, &next, row, Some(*index))?;
        }
        self.rows = next;
        Ok(changed.len())
    }

    fn check_unique(&self, row: &Record, skip: Option<usize>) -> Result<()> {
        check_unique(&self.model, &self.rows, row, skip)
    }
}

fn check_unique(
    model: &ModelDefinition,
    rows: &[Record],
    row: &Record,
    skip: Option<usize>,
) -> Result<()> {
    let mut keys = model.unique_keys();
    keys.insert(0, vec![model.primary_key().to_string()]);
    for key in keys {
        let values: Vec<&Value> = key
            .iter()
            .map(|name| row.get(name).unwrap_or(&Value::Null))
            .collect();
        // NULL never collides, as in SQL.
        if values.iter().any(|v| v.is_null()) {
            continue;
        }
        let taken = rows.iter().enumerate().any(|(index, other)| {
            Some(index) != skip
                && key
                    .iter()
                    .zip(&values)
                    .all(|(name, value)| other.get(name).is_some_and(|v| v.equals(value)))
        });
        if taken {
            return Err(ModelError::UniqueViolation(key));
        }
    }
    Ok(())
}

fn collect_equalities(predicate: &Predicate, values: &mut Record) {
    match predicate {
        Predicate::Compare(comparison) => {
            if let (Operator::Eq, Operand::Value(value)) =
                (comparison.operator, &comparison.operand)
            {
                values.set(&comparison.field, value.clone());
            }
        }
        Predicate::And(terms) => {
            for term in terms {
                collect_equalities(term, values);
            }
        }
        Predicate::Or(_) | Predicate::Not(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;

    fn model() -> Arc<ModelDefinition> {
        ModelDefinition::define("Foo")
            .attribute(Attribute::text("name"))
            .attribute(Attribute::text("code").unique())
            .attribute(Attribute::integer("hits").default_value(0))
            .finish()
    }

    #[test]
    fn test_create_assigns_ids_and_timestamps() {
        let mut foos = Collection::new(model());
        let a = foos.create(Record::new().with("name", "a")).unwrap();
        let b = foos.create(Record::new().with("name", "b")).unwrap();
        assert_eq!(a.pk(), Value::Int(1));
        assert_eq!(b.pk(), Value::Int(2));
        assert!(!a.is_new_record());
        assert!(matches!(a.get_data_value(CREATED_AT), Some(Value::Date(_))));
        assert!(matches!(a.get_data_value(UPDATED_AT), Some(Value::Date(_))));
        assert_eq!(foos.len(), 2);
    }

    #[test]
    fn test_explicit_id_advances_sequence() {
        let mut foos = Collection::new(model());
        foos.create(Record::new().with("id", 10)).unwrap();
        let next = foos.create(Record::new()).unwrap();
        assert_eq!(next.pk(), Value::Int(11));
        assert!(matches!(
            foos.create(Record::new().with("id", 10)),
            Err(ModelError::UniqueViolation(_))
        ));
    }

    #[test]
    fn test_unique_skips_nulls() {
        let mut foos = Collection::new(model());
        foos.create(Record::new().with("code", "x")).unwrap();
        foos.create(Record::new()).unwrap();
        foos.create(Record::new()).unwrap();
        let err = foos.create(Record::new().with("code", "x")).unwrap_err();
        assert!(matches!(err, ModelError::UniqueViolation(ref key) if key == &vec!["code".to_string()]));
        assert_eq!(foos.len(), 3);
    }

    #[test]
    fn test_bulk_create_is_atomic() {
        let mut foos = Collection::new(model());
        let result = foos.bulk_create(vec![
            Record::new().with("code", "a"),
            Record::new().with("code", "b"),
            Record::new().with("code", "a"),
        ]);
        assert!(result.is_err());
        assert!(foos.is_empty());
        let created = foos.create(Record::new()).unwrap();
        assert_eq!(created.pk(), Value::Int(1));
    }

    #[test]
    fn test_save_updates_existing() {
        let mut foos = Collection::new(model());
        let mut foo = foos.create(Record::new().with("name", "before")).unwrap();
        foo.set("name", "after").unwrap();
        foos.save(&mut foo).unwrap();
        assert_eq!(foos.len(), 1);
        let stored = foos.find_by_pk(1).unwrap();
        assert_eq!(
            stored.get("name").unwrap(),
            Value::Text("after".to_string())
        );
    }

    #[test]
    fn test_save_missing_row() {
        let mut foos = Collection::new(model());
        let mut foo = foos.create(Record::new()).unwrap();
        foos.truncate();
        assert!(matches!(foos.save(&mut foo), Err(ModelError::NotFound)));
    }

    #[test]
    fn test_update_and_destroy() {
        let mut foos = Collection::new(model());
        for name in ["a", "b", "c"] {
            foos.create(Record::new().with("name", name)).unwrap();
        }
        let changed = foos
            .update(
                &Record::new().with("name", "z"),
                Some(&Predicate::in_list("name", vec!["a", "c"])),
            )
            .unwrap();
        assert_eq!(changed, 2);
        assert_eq!(foos.count(Some(&Predicate::eq("name", "z"))).unwrap(), 2);

        let destroyed = foos.destroy(Some(&Predicate::eq("name", "z"))).unwrap();
        assert_eq!(destroyed, 2);
        assert_eq!(foos.len(), 1);
        assert_eq!(foos.destroy(None).unwrap(), 1);
        assert!(foos.is_empty());
    }

    #[test]
    fn test_update_unique_is_atomic() {
        let mut foos = Collection::new(model());
        foos.create(Record::new().with("name", "a")).unwrap();
        foos.create(Record::new().with("name", "b")).unwrap();
        let err = foos
            .update(&Record::new().with("code", "same"), None)
            .unwrap_err();
        assert!(matches!(err, ModelError::UniqueViolation(_)));
        assert_eq!(foos.count(Some(&Predicate::is_null("code"))).unwrap(), 2);
    }

    #[test]
    fn test_increment_many() {
        let mut foos = Collection::new(model());
        foos.create(Record::new().with("name", "a")).unwrap();
        foos.create(Record::new().with("name", "b")).unwrap();
        foos.increment(&[("hits", 3)], Some(&Predicate::eq("name", "a")))
            .unwrap();
        assert_eq!(
            foos.find_by_pk(1).unwrap().get("hits").unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            foos.find_by_pk(2).unwrap().get("hits").unwrap(),
            Value::Int(0)
        );
    }

    #[test]
    fn test_find_or_create() {
        let mut foos = Collection::new(model());
        let filter = Predicate::eq("name", "sdepold");
        let (first, created) = foos
            .find_or_create(&filter, Record::new().with("code", "technical"))
            .unwrap();
        assert!(created);
        assert_eq!(
            first.get("code").unwrap(),
            Value::Text("technical".to_string())
        );
        let (again, created) = foos.find_or_create(&filter, Record::new()).unwrap();
        assert!(!created);
        assert_eq!(again.pk(), first.pk());
    }

    #[test]
    fn test_collect_equalities_ignores_or() {
        let mut values = Record::new();
        let filter = Predicate::eq("a", 1)
            .and(Predicate::eq("b", 2).or(Predicate::eq("c", 3)))
            .and(Predicate::gt("d", 4));
        collect_equalities(&filter, &mut values);
        assert_eq!(values, Record::new().with("a", 1));
    }

    #[test]
    fn test_aggregate_with_filter() {
        let mut foos = Collection::new(model());
        foos.bulk_create(vec![
            Record::new().with("name", "a").with("hits", 2),
            Record::new().with("name", "b").with("hits", 5),
        ])
        .unwrap();
        assert_eq!(
            foos.aggregate(&Aggregate::sum("hits"), None).unwrap(),
            Value::Int(7)
        );
        assert_eq!(
            foos.aggregate(&Aggregate::sum("hits"), Some(&Predicate::eq("name", "b")))
                .unwrap(),
            Value::Int(5)
        );
    }
}
