//! # oxide-where-core
//!
//! An in-process engine that evaluates ORM-style where clauses over records.
//!
//! This crate provides:
//! - [`Value`] and [`Record`] for row-equivalent data
//! - [`Predicate`] trees of field comparisons combined with AND, OR and NOT
//! - [`Matcher`] to decide whether a record satisfies a predicate
//! - [`parse_where`] to read the ORM's `$`-operator object notation
//!
//! ## Building predicates
//!
//! ```rust
//! use oxide_where_core::{matches, Predicate, Record};
//!
//! let record = Record::new().with("title", "Boat-abc").with("rand", 900);
//!
//! let cheap_boats = Predicate::like("title", "Boat%")
//!     .and(Predicate::lt("rand", 1000).or(Predicate::is_null("rand")));
//!
//! assert!(matches(&record, &cheap_boats).unwrap());
//! assert!(!matches(&record, &cheap_boats.clone().not()).unwrap());
//! ```
//!
//! ## Case-insensitive LIKE
//!
//! `LIKE` is case-sensitive unless configured otherwise:
//!
//! ```rust
//! use oxide_where_core::{MatchOptions, Matcher, Predicate, Record};
//!
//! let record = Record::new().with("title", "boat-abc");
//! let predicate = Predicate::like("title", "Boat%");
//!
//! assert!(!Matcher::default().matches(&record, &predicate).unwrap());
//!
//! let matcher = Matcher::new(MatchOptions::new().case_insensitive_like(true));
//! assert!(matcher.matches(&record, &predicate).unwrap());
//! ```
//!
//! ## Errors
//!
//! Evaluation never fails because a field is missing: absent fields compare
//! as NULL. It fails with [`WhereError::TypeMismatch`] when ordering values
//! that have no common order (text against a number, for instance), and an
//! unrecognized operator tag is rejected with
//! [`WhereError::UnknownOperator`] when the predicate is built.

mod error;
mod eval;
pub mod predicate;
mod record;
mod value;
pub mod where_clause;

pub use error::{Result, WhereError};
pub use eval::{matches, MatchOptions, Matcher};
pub use predicate::{Comparison, LikePattern, Operand, OperandShape, Operator, Predicate};
pub use record::{FieldAccess, Record};
pub use value::{IntoValue, Value, ValueKind};
pub use where_clause::parse as parse_where;
