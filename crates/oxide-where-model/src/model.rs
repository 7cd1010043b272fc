//! Model definitions.
//!
//! A model is an ordered set of attributes plus model-level rules. Every
//! model has an integer primary key (`id` unless renamed) and, unless
//! disabled, `createdAt`/`updatedAt` timestamps.

use std::sync::Arc;

use oxide_where_core::{Record, Value};

use crate::attribute::{Attribute, DataType};
use crate::error::Result;
use crate::instance::Instance;
use crate::validation::ModelValidator;

/// Name of the creation timestamp attribute.
pub const CREATED_AT: &str = "createdAt";

/// Name of the update timestamp attribute.
pub const UPDATED_AT: &str = "updatedAt";

/// A finished model definition, shared by its instances.
///
/// # Example
///
/// ```
/// use oxide_where_model::{Attribute, ModelDefinition};
///
/// let user = ModelDefinition::define("User")
///     .attribute(Attribute::text("name"))
///     .attribute(Attribute::text("favoriteColor").default_value("green"))
///     .finish();
///
/// assert_eq!(user.table_name(), "Users");
/// assert!(user.attribute("id").is_some());
/// assert!(user.attribute("createdAt").is_some());
/// ```
#[derive(Debug)]
pub struct ModelDefinition {
    name: String,
    table_name: String,
    primary_key: String,
    attributes: Vec<Attribute>,
    timestamps: bool,
    validators: Vec<ModelValidator>,
    unique_indexes: Vec<Vec<String>>,
}

/// Builder for [`ModelDefinition`].
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    table_name: Option<String>,
    primary_key: String,
    attributes: Vec<Attribute>,
    timestamps: bool,
    validators: Vec<ModelValidator>,
    unique_indexes: Vec<Vec<String>>,
}

impl ModelBuilder {
    /// Overrides the table name.
    #[must_use]
    pub fn table_name(mut self, name: &str) -> Self {
        self.table_name = Some(name.to_string());
        self
    }

    /// Renames the primary key attribute.
    #[must_use]
    pub fn primary_key(mut self, name: &str) -> Self {
        self.primary_key = name.to_string();
        self
    }

    /// Adds an attribute. A later attribute with the same name replaces it.
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.retain(|a| a.name() != attribute.name());
        self.attributes.push(attribute);
        self
    }

    /// Enables or disables `createdAt`/`updatedAt`.
    #[must_use]
    pub const fn timestamps(mut self, value: bool) -> Self {
        self.timestamps = value;
        self
    }

    /// Adds a model-level validator.
    #[must_use]
    pub fn validator<F>(mut self, name: &str, check: F) -> Self
    where
        F: Fn(&Instance) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push(ModelValidator::new(name, check));
        self
    }

    /// Adds a composite unique index.
    #[must_use]
    pub fn unique_index(mut self, fields: &[&str]) -> Self {
        self.unique_indexes
            .push(fields.iter().map(ToString::to_string).collect());
        self
    }

    /// Finishes the definition, adding the implicit attributes.
    pub fn finish(self) -> Arc<ModelDefinition> {
        let mut attributes = Vec::with_capacity(self.attributes.len() + 3);
        if !self.attributes.iter().any(|a| a.name() == self.primary_key) {
            attributes.push(Attribute::integer(&self.primary_key).allow_null(false));
        }
        attributes.extend(self.attributes);
        if self.timestamps {
            for name in [CREATED_AT, UPDATED_AT] {
                if !attributes.iter().any(|a| a.name() == name) {
                    attributes.push(Attribute::date(name));
                }
            }
        }

        let table_name = self.table_name.unwrap_or_else(|| {
            if self.name.ends_with('s') {
                self.name.clone()
            } else {
                format!("{}s", self.name)
            }
        });

        Arc::new(ModelDefinition {
            name: self.name,
            table_name,
            primary_key: self.primary_key,
            attributes,
            timestamps: self.timestamps,
            validators: self.validators,
            unique_indexes: self.unique_indexes,
        })
    }
}

impl ModelDefinition {
    /// Starts defining a model.
    pub fn define(name: &str) -> ModelBuilder {
        ModelBuilder {
            name: name.to_string(),
            table_name: None,
            primary_key: "id".to_string(),
            attributes: Vec::new(),
            timestamps: true,
            validators: Vec::new(),
            unique_indexes: Vec::new(),
        }
    }

    /// Returns the model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the primary key attribute name.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Returns all attributes in definition order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Returns the attributes that are stored (not virtual).
    pub fn stored_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| !a.is_virtual())
    }

    /// Looks up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// Returns whether timestamps are maintained.
    pub const fn timestamps(&self) -> bool {
        self.timestamps
    }

    /// Returns the model-level validators.
    pub fn validators(&self) -> &[ModelValidator] {
        &self.validators
    }

    /// Returns every unique key: single unique attributes, then composite
    /// indexes.
    pub fn unique_keys(&self) -> Vec<Vec<String>> {
        self.attributes
            .iter()
            .filter(|a| a.is_unique())
            .map(|a| vec![a.name().to_string()])
            .chain(self.unique_indexes.iter().cloned())
            .collect()
    }

    /// Returns whether the primary key is assigned automatically.
    pub fn auto_increment(&self) -> bool {
        self.attribute(&self.primary_key)
            .is_some_and(|a| a.data_type() == DataType::Integer)
    }

    /// Builds a new, unsaved instance.
    ///
    /// Stored attributes with a default start with it; `values` are then
    /// applied through [`Instance::set`], so setters run.
    ///
    /// # Errors
    ///
    /// Fails if `values` names an unknown attribute or a setter fails.
    pub fn build(self: &Arc<Self>, values: Record) -> Result<Instance> {
        let defaults: Record = self
            .stored_attributes()
            .filter_map(|a| a.default().map(|v| (a.name().to_string(), v.clone())))
            .collect();
        let mut instance = Instance::from_parts(Arc::clone(self), defaults, true);
        for (name, value) in values {
            instance.set(&name, value)?;
        }
        Ok(instance)
    }

    /// Wraps an already stored row without running setters.
    pub fn restore(self: &Arc<Self>, row: Record) -> Instance {
        Instance::from_parts(Arc::clone(self), row, false)
    }

    /// Formats a data type mismatch message.
    pub(crate) fn type_message(attribute: &Attribute, value: &Value) -> String {
        format!(
            "expected {}, got {}",
            attribute.data_type().name(),
            value.kind()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implicit_attributes() {
        let model = ModelDefinition::define("Foo")
            .attribute(Attribute::integer("rand"))
            .finish();
        let names: Vec<_> = model.attributes().iter().map(Attribute::name).collect();
        assert_eq!(names, vec!["id", "rand", "createdAt", "updatedAt"]);
        assert!(model.auto_increment());
    }

    #[test]
    fn test_without_timestamps() {
        let model = ModelDefinition::define("Foo").timestamps(false).finish();
        assert!(model.attribute(CREATED_AT).is_none());
        assert!(!model.timestamps());
    }

    #[test]
    fn test_custom_primary_key() {
        let model = ModelDefinition::define("Foo")
            .primary_key("identifier")
            .attribute(Attribute::integer("identifier").allow_null(false))
            .finish();
        assert_eq!(model.primary_key(), "identifier");
        assert!(model.attribute("id").is_none());
        assert_eq!(model.attributes()[0].name(), "identifier");
    }

    #[test]
    fn test_table_name() {
        assert_eq!(ModelDefinition::define("User").finish().table_name(), "Users");
        assert_eq!(
            ModelDefinition::define("Foo").table_name("Foo").finish().table_name(),
            "Foo"
        );
    }

    #[test]
    fn test_unique_keys() {
        let model = ModelDefinition::define("Foo")
            .attribute(Attribute::text("someUnique").unique())
            .attribute(Attribute::text("uniqueOne"))
            .attribute(Attribute::integer("uniqueTwo"))
            .unique_index(&["uniqueOne", "uniqueTwo"])
            .finish();
        assert_eq!(
            model.unique_keys(),
            vec![
                vec!["someUnique".to_string()],
                vec!["uniqueOne".to_string(), "uniqueTwo".to_string()],
            ]
        );
    }

    #[test]
    fn test_build_applies_defaults() {
        let model = ModelDefinition::define("User")
            .attribute(Attribute::text("name"))
            .attribute(Attribute::text("favoriteColor").default_value("green"))
            .finish();
        let jane = model.build(Record::new().with("name", "Jane")).unwrap();
        assert!(jane.is_new_record());
        assert_eq!(
            jane.get_data_value("favoriteColor"),
            Some(&Value::Text("green".to_string()))
        );
    }

    #[test]
    fn test_build_rejects_unknown_attribute() {
        let model = ModelDefinition::define("User").finish();
        assert!(model.build(Record::new().with("nope", 1)).is_err());
    }
}
