//! Compiled statements.

use std::fmt;

use crate::builder::value::SqlValue;

/// SQL text plus its ordered arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementPlan {
    sql: String,
    args: Vec<SqlValue>,
}

impl StatementPlan {
    pub(crate) const fn new(sql: String, args: Vec<SqlValue>) -> Self {
        Self { sql, args }
    }

    /// Returns the SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the arguments in placeholder order.
    #[must_use]
    pub fn args(&self) -> &[SqlValue] {
        &self.args
    }

    /// Splits the plan into SQL text and arguments.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.args)
    }
}

impl fmt::Display for StatementPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
