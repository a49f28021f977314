//! Update requests.

use super::value::ToSqlValue;
use super::{assign, Assignment};
use crate::clause::Clause;
use crate::predicate::Predicate;

/// An update of the rows matching the filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    values: Vec<Assignment>,
    clauses: Vec<Clause>,
}

impl Update {
    /// Creates an update with nothing to set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: vec![],
            clauses: vec![],
        }
    }

    /// Sets a column value. Setting a column twice keeps the last value.
    #[must_use]
    pub fn set<T: ToSqlValue>(mut self, column: &str, value: T) -> Self {
        assign(&mut self.values, column, value.to_sql_value());
        self
    }

    /// Appends a filter predicate.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.clauses.push(Clause::Where(predicate));
        self
    }

    /// Appends clauses in order.
    #[must_use]
    pub fn clauses_from<I: IntoIterator<Item = Clause>>(mut self, clauses: I) -> Self {
        self.clauses.extend(clauses);
        self
    }

    /// Returns the assignments.
    #[must_use]
    pub fn values(&self) -> &[Assignment] {
        &self.values
    }

    /// Returns the clause list.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }
}
