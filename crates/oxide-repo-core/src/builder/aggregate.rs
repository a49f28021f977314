//! Aggregate requests.

use crate::aggregate::Aggregate;
use crate::clause::Clause;
use crate::predicate::Predicate;
use crate::sort::Sort;

/// An aggregate select.
///
/// Ordering terms may name a column or an aggregate alias such as
/// `count_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    clauses: Vec<Clause>,
}

impl Aggregation {
    /// Creates an aggregation with no output column.
    #[must_use]
    pub const fn new() -> Self {
        Self { clauses: vec![] }
    }

    /// Appends an output column.
    #[must_use]
    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.clauses.push(Clause::Aggregate(aggregate));
        self
    }

    /// Appends a grouping column.
    #[must_use]
    pub fn group_by(mut self, column: &str) -> Self {
        self.clauses.push(Clause::GroupBy(String::from(column)));
        self
    }

    /// Appends a filter predicate.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.clauses.push(Clause::Where(predicate));
        self
    }

    /// Appends an ordering term.
    #[must_use]
    pub fn order_by(mut self, sort: Sort) -> Self {
        self.clauses.push(Clause::OrderBy(sort));
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

    /// Returns the number of output columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.clauses
            .iter()
            .filter(|c| matches!(c, Clause::Aggregate(_)))
            .count()
    }
}
