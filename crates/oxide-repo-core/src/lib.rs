//! # oxide-repo-core
//!
//! Schema-driven query composition and SQL compilation.
//!
//! This crate provides:
//! - A type resolver that classifies field types into storage descriptors
//! - A schema model with exactly one identity column per record
//! - Predicate, sort and aggregate models collected as ordered clause lists
//! - A dialect compiler producing parameterized statement plans for
//!   Postgres (`$N`, quoted identifiers, `RETURNING`) and SQLite (`?`,
//!   last-insert-id)
//! - A generation orchestrator handing structured repository plans to an
//!   external emitter
//!
//! The crate performs no I/O. Executing plans is the job of `oxide-repo`.
//!
//! ## Example
//!
//! ```rust
//! use oxide_repo_core::builder::{Create, Update};
//! use oxide_repo_core::{build_schema, ColumnDescriptor, Compiler, Dialect, Predicate, RecordDescriptor};
//!
//! let schema = build_schema(
//!     &RecordDescriptor::new("user", "users")
//!         .column(ColumnDescriptor::of::<i64>("id").ident().auto())
//!         .column(ColumnDescriptor::of::<String>("name"))
//!         .column(ColumnDescriptor::of::<Option<String>>("email")),
//! )
//! .unwrap();
//!
//! let postgres = Compiler::new(&schema, Dialect::postgres());
//! let sqlite = Compiler::new(&schema, Dialect::sqlite());
//! let update = Update::new().set("name", "alice").filter(Predicate::eq("id", 7));
//!
//! assert_eq!(
//!     postgres.update(&update).unwrap().sql(),
//!     r#"UPDATE "users" SET "name" = $1 WHERE "id" = $2"#
//! );
//! assert_eq!(
//!     sqlite.update(&update).unwrap().sql(),
//!     "UPDATE users SET name = ? WHERE id = ?"
//! );
//!
//! // Zero values are left out of the column list.
//! let plan = sqlite.insert_one(&Create::new().set("name", "")).unwrap();
//! assert_eq!(plan.sql(), "INSERT INTO users DEFAULT VALUES");
//! ```

pub mod aggregate;
pub mod builder;
pub mod clause;
pub mod compiler;
pub mod dialect;
pub mod error;
pub mod generate;
pub mod predicate;
pub mod schema;
pub mod sort;
pub mod types;

pub use aggregate::{Aggregate, AggregateSet, Function};
pub use builder::{Aggregation, Create, Delete, Query, SqlValue, ToSqlValue, Update};
pub use clause::{Clause, Clauses};
pub use compiler::{CompileOptions, Compiler, StatementPlan, WritePolicy};
pub use dialect::{Dialect, IdentityStrategy, Placeholder};
pub use error::{DialectCapabilityError, Error, Result, SchemaError, TypeResolutionError};
pub use generate::{generate, BackendPlan, Emitter, GeneratedRepository, JsonEmitter, Method, StatementTemplate};
pub use predicate::{Operand, Operator, Predicate, PredicateSet};
pub use schema::{build_schema, Column, ColumnDescriptor, RecordDescriptor, Schema};
pub use sort::{Direction, Sort, SortSet};
pub use types::{Kind, Shaped, TypeDescriptor, TypeShape};
