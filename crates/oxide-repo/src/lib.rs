//! # oxide-repo
//!
//! Typed repositories over `sqlx`, driven by the statement plans of
//! `oxide-repo-core`.
//!
//! This crate provides:
//! - `Record` and `AggregateRow` traits for the types stored and read back
//! - `Repository` with `create`, `create_many`, `query`, `query_one`,
//!   `update`, `delete` and `aggregate`, each with a `_tx` twin
//! - A `Backend` execution boundary with SQLite and Postgres implementations
//! - An opaque `Tx` handle shared by repositories of the same backend
//!
//! ## Quick Start
//!
//! ```ignore
//! use oxide_repo::{Predicate, Query, Record, Repository, Sort, SqliteBackend};
//! use sqlx::SqlitePool;
//!
//! #[derive(Record)]
//! #[record(collection = "users")]
//! struct User {
//!     #[column(ident, auto)]
//!     id: i64,
//!     email: String,
//!     age: Option<i32>,
//! }
//!
//! async fn example(pool: SqlitePool) -> oxide_repo::Result<()> {
//!     let users = Repository::<User, _>::new(SqliteBackend::new(pool))?;
//!
//!     let id = users
//!         .create(&User { id: 0, email: "alice@example.com".into(), age: Some(30) })
//!         .await?;
//!
//!     let alice = users.query_one(&Query::new().filter(Predicate::eq("id", id))).await?;
//!
//!     let adults = users
//!         .query(
//!             &Query::new()
//!                 .filter(Predicate::gt_or_eq("age", 18))
//!                 .order_by(Sort::desc("age"))
//!                 .limit(10),
//!         )
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Transactions
//!
//! ```ignore
//! let mut tx = users.tx().await?;
//! users.create_tx(&mut tx, &alice).await?;
//! users.update_tx(&mut tx, &Update::new().set("age", 31).filter(Predicate::eq("id", id))).await?;
//! users.commit(tx).await?;
//! ```
//!
//! A handle opened on one backend is refused by repositories of another one
//! with a `TxMismatch` error, before any statement runs.
//!
//! ## Aggregates
//!
//! ```ignore
//! use oxide_repo::{Aggregate, Aggregation};
//!
//! let rows: Vec<(Option<String>, i64)> = users
//!     .aggregate(
//!         &Aggregation::new()
//!             .aggregate(Aggregate::column("group_res"))
//!             .aggregate(Aggregate::count("id"))
//!             .group_by("group_res"),
//!     )
//!     .await?;
//! ```

pub mod backend;
pub mod error;
pub mod record;
pub mod repository;
pub mod row;

pub use backend::{Backend, ExecResult, PostgresBackend, SqliteBackend, Tx};
pub use error::{RepoError, Result};
pub use record::{AggregateRow, Record};
pub use repository::Repository;
pub use row::{json_to_value, FromValue, Row};

// Re-export core types for convenience
pub use oxide_repo_core::builder::{Aggregation, Create, Delete, Query, Update};
pub use oxide_repo_core::{
    Aggregate, ColumnDescriptor, CompileOptions, Dialect, Direction, Operator, Predicate,
    RecordDescriptor, Shaped, Sort, SqlValue, ToSqlValue, TypeShape, WritePolicy,
};
