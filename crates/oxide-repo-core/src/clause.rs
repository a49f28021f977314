//! Ordered clause lists.
//!
//! Callers describe a statement as a flat list of [`Clause`] values. The
//! compiler splits the list into predicate, sort and aggregate sets, keeping
//! the order in which entries were pushed.

use crate::aggregate::{Aggregate, AggregateSet};
use crate::error::{Error, Result};
use crate::predicate::{Predicate, PredicateSet};
use crate::sort::{Sort, SortSet};

/// One entry of a statement description.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// A filter term.
    Where(Predicate),
    /// An ordering term.
    OrderBy(Sort),
    /// An aggregate output column.
    Aggregate(Aggregate),
    /// A grouping column.
    GroupBy(String),
}

impl Clause {
    /// Returns the clause name used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Where(_) => "WHERE",
            Self::OrderBy(_) => "ORDER BY",
            Self::Aggregate(_) => "aggregate",
            Self::GroupBy(_) => "GROUP BY",
        }
    }
}

impl From<Predicate> for Clause {
    fn from(predicate: Predicate) -> Self {
        Self::Where(predicate)
    }
}

impl From<Sort> for Clause {
    fn from(sort: Sort) -> Self {
        Self::OrderBy(sort)
    }
}

impl From<Aggregate> for Clause {
    fn from(aggregate: Aggregate) -> Self {
        Self::Aggregate(aggregate)
    }
}

/// Which clause kinds an operation accepts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Accepts {
    pub(crate) operation: &'static str,
    pub(crate) sorts: bool,
    pub(crate) aggregates: bool,
}

/// A clause list split by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clauses {
    /// Filter terms.
    pub predicates: PredicateSet,
    /// Ordering terms.
    pub sorts: SortSet,
    /// Aggregates and grouping columns.
    pub aggregates: AggregateSet,
}

impl Clauses {
    /// Splits a clause list, keeping relative order within each kind.
    pub fn split<'a, I>(clauses: I) -> Self
    where
        I: IntoIterator<Item = &'a Clause>,
    {
        let mut split = Self::default();
        for clause in clauses {
            match clause {
                Clause::Where(p) => split.predicates.append(p.clone()),
                Clause::OrderBy(s) => split.sorts.append(s.clone()),
                Clause::Aggregate(a) => split.aggregates.append(a.clone()),
                Clause::GroupBy(column) => split.aggregates.group(column),
            }
        }
        split
    }

    pub(crate) fn split_for<'a, I>(clauses: I, accepts: Accepts) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Clause>,
    {
        let clauses: Vec<&Clause> = clauses.into_iter().collect();
        for clause in &clauses {
            let allowed = match clause {
                Clause::Where(_) => true,
                Clause::OrderBy(_) => accepts.sorts,
                Clause::Aggregate(_) | Clause::GroupBy(_) => accepts.aggregates,
            };
            if !allowed {
                return Err(Error::UnexpectedClause {
                    operation: accepts.operation,
                    clause: clause.kind(),
                });
            }
        }
        Ok(Self::split(clauses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Operator;

    #[test]
    fn test_split_keeps_order() {
        let clauses = vec![
            Clause::from(Predicate::eq("age", 30)),
            Clause::from(Sort::desc("name")),
            Clause::from(Predicate::gt("created_at", 5)),
            Clause::from(Aggregate::count("id")),
            Clause::GroupBy(String::from("name")),
        ];
        let split = Clauses::split(&clauses);

        let ops: Vec<Operator> = split.predicates.all().iter().map(|p| p.operator).collect();
        assert_eq!(ops, vec![Operator::Eq, Operator::Gt]);
        assert_eq!(split.sorts.all(), [Sort::desc("name")]);
        assert_eq!(split.aggregates.all(), [Aggregate::count("id")]);
        assert_eq!(split.aggregates.groups(), ["name"]);
    }

    #[test]
    fn test_split_rejects_foreign_clause() {
        let clauses = vec![Clause::from(Sort::asc("name"))];
        let accepts = Accepts {
            operation: "delete",
            sorts: false,
            aggregates: false,
        };
        let err = Clauses::split_for(&clauses, accepts).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedClause {
                operation: "delete",
                clause: "ORDER BY"
            }
        ));
    }
}
