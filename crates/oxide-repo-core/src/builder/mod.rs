//! Statement requests.
//!
//! Each request type describes one operation against a collection: the
//! values to write and the ordered clause list. Requests carry no SQL; the
//! [`Compiler`](crate::compiler::Compiler) turns them into statement plans.
//!
//! # Example
//!
//! ```rust
//! use oxide_repo_core::builder::Query;
//! use oxide_repo_core::{Predicate, Sort};
//!
//! let query = Query::new()
//!     .filter(Predicate::eq("age", 30))
//!     .order_by(Sort::desc("created_at"))
//!     .limit(10);
//!
//! assert_eq!(query.clauses().len(), 2);
//! ```

mod aggregate;
mod delete;
mod insert;
mod select;
mod update;
pub mod value;

pub use aggregate::Aggregation;
pub use delete::Delete;
pub use insert::Create;
pub use select::Query;
pub use update::Update;
pub use value::{SqlValue, ToSqlValue};

/// A value assigned to a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Storage name.
    pub column: String,
    /// Assigned value.
    pub value: SqlValue,
}

/// Sets `column`, replacing an earlier assignment to the same column.
fn assign(assignments: &mut Vec<Assignment>, column: &str, value: SqlValue) {
    match assignments.iter_mut().find(|a| a.column == column) {
        Some(existing) => existing.value = value,
        None => assignments.push(Assignment {
            column: String::from(column),
            value,
        }),
    }
}
