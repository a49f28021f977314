//! Insert requests.

use super::value::ToSqlValue;
use super::{assign, Assignment};

/// Values of one row to insert.
///
/// Only columns that were set take part in the insert. Under the default
/// write policy, set columns holding a zero value are omitted as well.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Create {
    values: Vec<Assignment>,
}

impl Create {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self { values: vec![] }
    }

    /// Sets a column value. Setting a column twice keeps the last value.
    #[must_use]
    pub fn set<T: ToSqlValue>(mut self, column: &str, value: T) -> Self {
        assign(&mut self.values, column, value.to_sql_value());
        self
    }

    /// Builds a row from `(column, value)` pairs.
    #[must_use]
    pub fn from_values<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, T)>,
        T: ToSqlValue,
    {
        values
            .into_iter()
            .fold(Self::new(), |create, (column, value)| create.set(column, value))
    }

    /// Returns the assignments in the order they were first set.
    #[must_use]
    pub fn values(&self) -> &[Assignment] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SqlValue;

    #[test]
    fn test_set_replaces() {
        let create = Create::new().set("name", "a").set("age", 3).set("name", "b");
        assert_eq!(create.values().len(), 2);
        assert_eq!(create.values()[0].column, "name");
        assert_eq!(create.values()[0].value, SqlValue::Text(String::from("b")));
    }

    #[test]
    fn test_from_values() {
        let create = Create::from_values([("email", SqlValue::Null), ("age", SqlValue::Int(4))]);
        let columns: Vec<&str> = create.values().iter().map(|a| a.column.as_str()).collect();
        assert_eq!(columns, vec!["email", "age"]);
    }
}
