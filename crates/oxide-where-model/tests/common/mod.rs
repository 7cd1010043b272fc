#![allow(dead_code)]

use std::sync::Arc;

use oxide_where_core::{Record, Value};
use oxide_where_model::{Attribute, Collection, Instance, ModelDefinition};

/// A user with a virtual `fullName` backed by `firstName` and `lastName`.
pub fn user_model() -> Arc<ModelDefinition> {
    ModelDefinition::define("User")
        .attribute(Attribute::text("firstName"))
        .attribute(Attribute::text("lastName"))
        .attribute(
            Attribute::virtual_field("fullName")
                .getter(|user| {
                    Value::Text(format!(
                        "{} {}",
                        text(user, "firstName"),
                        text(user, "lastName")
                    ))
                })
                .setter(|user, value| {
                    let full = value.as_str().unwrap_or_default().to_string();
                    let (first, last) = full.split_once(' ').unwrap_or((full.as_str(), ""));
                    user.set_data_value("firstName", first);
                    user.set_data_value("lastName", last);
                    Ok(())
                }),
        )
        .attribute(Attribute::text("favoriteColor").default_value("green"))
        .attribute(Attribute::integer("age"))
        .attribute(Attribute::integer("cash"))
        .finish()
}

/// A post whose `content` is stored reversed and read back in order.
pub fn post_model() -> Arc<ModelDefinition> {
    ModelDefinition::define("Post")
        .attribute(
            Attribute::text("content")
                .getter(|post| {
                    Value::Text(text(post, "content").chars().rev().collect())
                })
                .setter(|post, value| {
                    let stored: String = value.as_str().unwrap_or_default().chars().rev().collect();
                    post.set_data_value("content", stored);
                    Ok(())
                }),
        )
        .finish()
}

/// A place with bounded coordinates that must be set together.
pub fn place_model() -> Arc<ModelDefinition> {
    ModelDefinition::define("Place")
        .attribute(Attribute::text("name"))
        .attribute(Attribute::text("address"))
        .attribute(
            Attribute::integer("latitude")
                .default_value(Value::Null)
                .min(-90.0)
                .max(90.0),
        )
        .attribute(
            Attribute::integer("longitude")
                .default_value(Value::Null)
                .min(-180.0)
                .max(180.0),
        )
        .validator("bothCoordsOrNone", |place| {
            let missing = |name| place.get_data_value(name).map_or(true, Value::is_null);
            if missing("latitude") == missing("longitude") {
                Ok(())
            } else {
                Err("Either both latitude and longitude, or neither!".to_string())
            }
        })
        .finish()
}

/// A `Foo` collection holding the operator query fixture rows.
pub fn foo_collection() -> Collection {
    let foo = ModelDefinition::define("Foo")
        .table_name("Foo")
        .attribute(Attribute::integer("rand"))
        .attribute(Attribute::text("title"))
        .attribute(Attribute::text("description"))
        .finish();
    let mut foos = Collection::new(foo);
    foos.bulk_create(vec![
        Record::new()
            .with("rand", 1100)
            .with("title", "Boat-abc")
            .with("description", "abc-boat-123"),
        Record::new()
            .with("rand", 900)
            .with("title", "Boat-abc")
            .with("description", "abc-boat-123"),
        Record::new()
            .with("rand", Value::Null)
            .with("title", "abc-Boat-123")
            .with("description", "abc-boat-123"),
        Record::new().with("title", "Boat-abc"),
    ])
    .unwrap_or_else(|e| panic!("fixture rows rejected: {e}"));
    foos
}

/// Returns the primary keys of `instances`.
pub fn ids(instances: &[Instance]) -> Vec<i64> {
    instances
        .iter()
        .map(|i| match i.pk() {
            Value::Int(id) => id,
            other => panic!("instance without integer id: {other:?}"),
        })
        .collect()
}

fn text(instance: &Instance, name: &str) -> String {
    instance
        .get_data_value(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
