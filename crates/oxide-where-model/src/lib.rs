//! # oxide-where-model
//!
//! Model definitions, instances and in-memory collections queried with
//! `oxide-where-core` predicates.
//!
//! This crate provides:
//! - [`ModelDefinition`] and [`Attribute`] to describe a model, including
//!   defaults, getters, setters and virtual attributes
//! - [`Instance`] for a single row, with validation
//! - [`Collection`] to store rows and run finder queries
//! - [`FindOptions`] and [`Aggregate`] for filtering, ordering, paging,
//!   projection and aggregation
//!
//! ## Example
//!
//! ```rust
//! use oxide_where_core::{Predicate, Record, Value};
//! use oxide_where_model::{Attribute, Collection, FindOptions, ModelDefinition};
//!
//! let user = ModelDefinition::define("User")
//!     .attribute(Attribute::text("username"))
//!     .attribute(Attribute::integer("age").min(0.0))
//!     .finish();
//!
//! let mut users = Collection::new(user);
//! users.create(Record::new().with("username", "alice").with("age", 31)).unwrap();
//! users.create(Record::new().with("username", "bob").with("age", 17)).unwrap();
//!
//! let adults = users
//!     .find_all(&FindOptions::new().filter(Predicate::gte("age", 18)))
//!     .unwrap();
//! assert_eq!(adults.len(), 1);
//! assert_eq!(adults[0].get("username").unwrap(), Value::Text("alice".into()));
//!
//! // Validators run before anything is stored.
//! assert!(users.create(Record::new().with("age", -1)).is_err());
//! assert_eq!(users.len(), 2);
//! ```

mod aggregate;
mod attribute;
mod collection;
mod error;
mod instance;
mod model;
pub mod query;
pub mod validation;

pub use aggregate::Aggregate;
pub use attribute::{Attribute, DataType, Getter, Setter};
pub use collection::{Collection, CountedRows};
pub use error::{ModelError, Result, ValidationErrors};
pub use instance::Instance;
pub use model::{ModelBuilder, ModelDefinition, CREATED_AT, UPDATED_AT};
pub use query::{Attributes, FindOptions, OrderBy, OrderDirection, Projection};
pub use validation::{
    InValidator, LengthValidator, MaxValidator, MinValidator, ModelValidator, NotEmptyValidator,
    PatternValidator, Validator,
};
