//! Ordering terms.

use std::fmt;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl Direction {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A column bound to a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Column, or aggregate alias in aggregate queries.
    pub column: String,
    /// Direction.
    pub direction: Direction,
}

impl Sort {
    /// Ascending order on `column`.
    #[must_use]
    pub fn asc(column: &str) -> Self {
        Self {
            column: String::from(column),
            direction: Direction::Asc,
        }
    }

    /// Descending order on `column`.
    #[must_use]
    pub fn desc(column: &str) -> Self {
        Self {
            column: String::from(column),
            direction: Direction::Desc,
        }
    }
}

/// Insertion-ordered list of sorts. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSet {
    sorts: Vec<Sort>,
}

impl SortSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { sorts: vec![] }
    }

    /// Appends a sort.
    pub fn append(&mut self, sort: Sort) {
        self.sorts.push(sort);
    }

    /// Returns every sort in insertion order.
    #[must_use]
    pub fn all(&self) -> &[Sort] {
        &self.sorts
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorts.is_empty()
    }
}

impl FromIterator<Sort> for SortSet {
    fn from_iter<I: IntoIterator<Item = Sort>>(iter: I) -> Self {
        Self {
            sorts: iter.into_iter().collect(),
        }
    }
}
