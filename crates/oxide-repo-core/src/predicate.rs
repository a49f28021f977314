//! Filter predicates.
//!
//! Predicates are collected in insertion order and combined with `AND` when
//! compiled. There is no `OR`.

use std::fmt;

use crate::builder::value::{SqlValue, ToSqlValue};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal (`=`).
    Eq,
    /// Not equal (`<>`).
    NotEq,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    GtOrEq,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    LtOrEq,
    /// `IS NULL`.
    IsNull,
    /// `IS NOT NULL`.
    IsNotNull,
    /// `IN (...)`.
    In,
    /// `NOT IN (...)`.
    NotIn,
}

impl Operator {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Gt => ">",
            Self::GtOrEq => ">=",
            Self::Lt => "<",
            Self::LtOrEq => "<=",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
        }
    }

    /// Returns whether the operator ignores its operand.
    #[must_use]
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }

    /// Returns whether the operator takes a list.
    #[must_use]
    pub const fn is_membership(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A literal value, bound as an argument.
    Value(SqlValue),
    /// No operand (`IS NULL` / `IS NOT NULL`).
    Null,
    /// A list of literal values (`IN` / `NOT IN`).
    List(Vec<SqlValue>),
    /// Another column of the same collection.
    Column(String),
}

/// A single filter term: `column operator operand`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Column being filtered.
    pub column: String,
    /// Comparison operator.
    pub operator: Operator,
    /// Right-hand side.
    pub operand: Operand,
}

impl Predicate {
    fn binary<T: ToSqlValue>(column: &str, operator: Operator, value: T) -> Self {
        Self {
            column: String::from(column),
            operator,
            operand: Operand::Value(value.to_sql_value()),
        }
    }

    fn membership<I, T>(column: &str, operator: Operator, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToSqlValue,
    {
        Self {
            column: String::from(column),
            operator,
            operand: Operand::List(values.into_iter().map(ToSqlValue::to_sql_value).collect()),
        }
    }

    /// `column = value`.
    #[must_use]
    pub fn eq<T: ToSqlValue>(column: &str, value: T) -> Self {
        Self::binary(column, Operator::Eq, value)
    }

    /// `column <> value`.
    #[must_use]
    pub fn not_eq<T: ToSqlValue>(column: &str, value: T) -> Self {
        Self::binary(column, Operator::NotEq, value)
    }

    /// `column > value`.
    #[must_use]
    pub fn gt<T: ToSqlValue>(column: &str, value: T) -> Self {
        Self::binary(column, Operator::Gt, value)
    }

    /// `column >= value`.
    #[must_use]
    pub fn gt_or_eq<T: ToSqlValue>(column: &str, value: T) -> Self {
        Self::binary(column, Operator::GtOrEq, value)
    }

    /// `column < value`.
    #[must_use]
    pub fn lt<T: ToSqlValue>(column: &str, value: T) -> Self {
        Self::binary(column, Operator::Lt, value)
    }

    /// `column <= value`.
    #[must_use]
    pub fn lt_or_eq<T: ToSqlValue>(column: &str, value: T) -> Self {
        Self::binary(column, Operator::LtOrEq, value)
    }

    /// `column IS NULL`.
    #[must_use]
    pub fn is_null(column: &str) -> Self {
        Self {
            column: String::from(column),
            operator: Operator::IsNull,
            operand: Operand::Null,
        }
    }

    /// `column IS NOT NULL`.
    #[must_use]
    pub fn is_not_null(column: &str) -> Self {
        Self {
            column: String::from(column),
            operator: Operator::IsNotNull,
            operand: Operand::Null,
        }
    }

    /// `column IN (values...)`. An empty list produces no clause.
    #[must_use]
    pub fn in_list<I, T>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToSqlValue,
    {
        Self::membership(column, Operator::In, values)
    }

    /// `column NOT IN (values...)`. An empty list produces no clause.
    #[must_use]
    pub fn not_in<I, T>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToSqlValue,
    {
        Self::membership(column, Operator::NotIn, values)
    }

    /// Compares `column` to `other` with `operator`.
    ///
    /// `column` must be marked comparable in the schema.
    #[must_use]
    pub fn columns(column: &str, operator: Operator, other: &str) -> Self {
        Self {
            column: String::from(column),
            operator,
            operand: Operand::Column(String::from(other)),
        }
    }
}

/// Insertion-ordered list of predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { predicates: vec![] }
    }

    /// Appends a predicate.
    pub fn append(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    /// Returns every predicate in insertion order.
    #[must_use]
    pub fn all(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl FromIterator<Predicate> for PredicateSet {
    fn from_iter<I: IntoIterator<Item = Predicate>>(iter: I) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}

impl Extend<Predicate> for PredicateSet {
    fn extend<I: IntoIterator<Item = Predicate>>(&mut self, iter: I) {
        self.predicates.extend(iter);
    }
}
