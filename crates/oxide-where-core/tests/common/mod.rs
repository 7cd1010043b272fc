#![allow(dead_code)]

use chrono::{Duration, Utc};
use oxide_where_core::{Matcher, Predicate, Record, Value};

/// Rows of the `Foo` table used by the operator examples.
pub fn foos() -> Vec<Record> {
    let created = Utc::now() - Duration::seconds(5);
    vec![
        Record::new()
            .with("id", 1)
            .with("rand", 1100)
            .with("title", "Boat-abc")
            .with("description", "abc-boat-123")
            .with("createdAt", created),
        Record::new()
            .with("id", 2)
            .with("rand", 900)
            .with("title", "Boat-abc")
            .with("description", "abc-boat-123")
            .with("createdAt", created),
        Record::new()
            .with("id", 3)
            .with("rand", Value::Null)
            .with("title", "abc-Boat-123")
            .with("description", "abc-boat-123")
            .with("createdAt", created),
        Record::new()
            .with("id", 4)
            .with("title", "Boat-abc")
            .with("createdAt", created),
    ]
}

/// Rows of the `Project` table used by the operator examples.
pub fn projects() -> Vec<Record> {
    [
        (1, "Project A", "Hello World."),
        (2, "Some Project", "Hello World."),
        (3, "Some Project", "World Hello."),
        (4, "Some Project", "Hello World."),
        (5, "Some Project", "这个是应该被选中的。"),
    ]
    .into_iter()
    .map(|(id, name, description)| {
        Record::new()
            .with("id", id)
            .with("name", name)
            .with("description", description)
    })
    .collect()
}

/// Returns the `id` of every record matching `predicate`.
pub fn matching_ids(records: &[Record], predicate: &Predicate) -> Vec<i64> {
    Matcher::default()
        .filter(records, predicate)
        .unwrap_or_else(|e| panic!("evaluation failed for {predicate}: {e}"))
        .into_iter()
        .map(|r| match r.get("id") {
            Some(Value::Int(id)) => *id,
            other => panic!("record without integer id: {other:?}"),
        })
        .collect()
}
