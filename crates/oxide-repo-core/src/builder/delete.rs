//! Delete requests.

use crate::clause::Clause;
use crate::predicate::Predicate;

/// A delete of the rows matching the filter.
///
/// A delete without predicates removes every row of the collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delete {
    clauses: Vec<Clause>,
}

impl Delete {
    /// Creates an unfiltered delete.
    #[must_use]
    pub const fn new() -> Self {
        Self { clauses: vec![] }
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

    /// Returns the clause list.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }
}
