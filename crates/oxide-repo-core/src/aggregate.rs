//! Aggregate functions and grouping.

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    /// `AVG`.
    Avg,
    /// `COUNT`.
    Count,
    /// `MAX`.
    Max,
    /// `MIN`.
    Min,
    /// `SUM`.
    Sum,
    /// Passes the column through unchanged, for group keys.
    None,
}

impl Function {
    /// Returns the SQL function name, or `None` for the pass-through.
    #[must_use]
    pub const fn as_sql(self) -> Option<&'static str> {
        match self {
            Self::Avg => Some("AVG"),
            Self::Count => Some("COUNT"),
            Self::Max => Some("MAX"),
            Self::Min => Some("MIN"),
            Self::Sum => Some("SUM"),
            Self::None => None,
        }
    }

    const fn prefix(self) -> Option<&'static str> {
        match self {
            Self::Avg => Some("avg"),
            Self::Count => Some("count"),
            Self::Max => Some("max"),
            Self::Min => Some("min"),
            Self::Sum => Some("sum"),
            Self::None => None,
        }
    }
}

/// A function applied to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    /// Column the function reads.
    pub column: String,
    /// Function.
    pub function: Function,
}

impl Aggregate {
    /// Creates an aggregate.
    #[must_use]
    pub fn new(function: Function, column: &str) -> Self {
        Self {
            column: String::from(column),
            function,
        }
    }

    /// `AVG(column)`.
    #[must_use]
    pub fn avg(column: &str) -> Self {
        Self::new(Function::Avg, column)
    }

    /// `COUNT(column)`.
    #[must_use]
    pub fn count(column: &str) -> Self {
        Self::new(Function::Count, column)
    }

    /// `MAX(column)`.
    #[must_use]
    pub fn max(column: &str) -> Self {
        Self::new(Function::Max, column)
    }

    /// `MIN(column)`.
    #[must_use]
    pub fn min(column: &str) -> Self {
        Self::new(Function::Min, column)
    }

    /// `SUM(column)`.
    #[must_use]
    pub fn sum(column: &str) -> Self {
        Self::new(Function::Sum, column)
    }

    /// The bare column.
    #[must_use]
    pub fn column(column: &str) -> Self {
        Self::new(Function::None, column)
    }

    /// Returns the output column name: `{func}_{column}`, or the column
    /// itself for the pass-through.
    #[must_use]
    pub fn alias(&self) -> String {
        match self.function.prefix() {
            Some(prefix) => format!("{prefix}_{}", self.column),
            None => self.column.clone(),
        }
    }
}

/// Insertion-ordered aggregates plus grouping columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateSet {
    aggregates: Vec<Aggregate>,
    groups: Vec<String>,
}

impl AggregateSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            aggregates: vec![],
            groups: vec![],
        }
    }

    /// Appends an aggregate.
    pub fn append(&mut self, aggregate: Aggregate) {
        self.aggregates.push(aggregate);
    }

    /// Appends a grouping column.
    pub fn group(&mut self, column: &str) {
        self.groups.push(String::from(column));
    }

    /// Returns every aggregate in insertion order.
    #[must_use]
    pub fn all(&self) -> &[Aggregate] {
        &self.aggregates
    }

    /// Returns the grouping columns in insertion order.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Returns whether a name refers to the alias of a function output.
    ///
    /// Bare columns are not aliases; they keep their column name.
    #[must_use]
    pub fn has_alias(&self, name: &str) -> bool {
        self.aggregates
            .iter()
            .any(|a| a.function != Function::None && a.alias() == name)
    }
}
