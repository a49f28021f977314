//! Select requests.

use crate::clause::Clause;
use crate::predicate::Predicate;
use crate::sort::Sort;

/// A select over a collection.
///
/// `limit` and `offset` are only emitted when greater than zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    clauses: Vec<Clause>,
    limit: u64,
    offset: u64,
}

impl Query {
    /// Creates an unfiltered query.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            clauses: vec![],
            limit: 0,
            offset: 0,
        }
    }

    /// Appends any clause.
    #[must_use]
    pub fn clause(mut self, clause: impl Into<Clause>) -> Self {
        self.clauses.push(clause.into());
        self
    }

    /// Appends clauses in order.
    #[must_use]
    pub fn clauses_from<I: IntoIterator<Item = Clause>>(mut self, clauses: I) -> Self {
        self.clauses.extend(clauses);
        self
    }

    /// Appends a filter predicate.
    #[must_use]
    pub fn filter(self, predicate: Predicate) -> Self {
        self.clause(predicate)
    }

    /// Appends an ordering term.
    #[must_use]
    pub fn order_by(self, sort: Sort) -> Self {
        self.clause(sort)
    }

    /// Sets the LIMIT.
    #[must_use]
    pub const fn limit(mut self, n: u64) -> Self {
        self.limit = n;
        self
    }

    /// Sets the OFFSET.
    #[must_use]
    pub const fn offset(mut self, n: u64) -> Self {
        self.offset = n;
        self
    }

    /// Returns the clause list.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Returns the LIMIT, zero when unset.
    #[must_use]
    pub const fn limit_value(&self) -> u64 {
        self.limit
    }

    /// Returns the OFFSET, zero when unset.
    #[must_use]
    pub const fn offset_value(&self) -> u64 {
        self.offset
    }
}
