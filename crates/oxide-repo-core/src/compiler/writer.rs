//! SQL text accumulation with dialect-aware placeholders.

use super::plan::StatementPlan;
use crate::builder::value::SqlValue;
use crate::dialect::Dialect;

pub(super) struct SqlWriter<'d> {
    dialect: &'d Dialect,
    sql: String,
    args: Vec<SqlValue>,
}

impl<'d> SqlWriter<'d> {
    pub(super) fn new(dialect: &'d Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            args: vec![],
        }
    }

    pub(super) fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    pub(super) fn push_ident(&mut self, name: &str) {
        self.sql.push_str(&self.dialect.quote_identifier(name));
    }

    /// Writes `a, b, c` with every name quoted.
    pub(super) fn push_idents<'a, I>(&mut self, names: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for (i, name) in names.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_ident(name);
        }
    }

    /// Binds an argument and writes its placeholder.
    pub(super) fn push_arg(&mut self, value: SqlValue) {
        if let Some(literal) = self.dialect.untyped_literal(&value) {
            self.sql.push_str(&literal);
            return;
        }
        self.args.push(value);
        let placeholder = self.dialect.placeholder(self.args.len());
        self.sql.push_str(&placeholder);
    }

    /// Binds arguments and writes `p1, p2, ...`.
    pub(super) fn push_args<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = SqlValue>,
    {
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_arg(value);
        }
    }

    pub(super) fn finish(self) -> StatementPlan {
        StatementPlan::new(self.sql, self.args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_placeholders_follow_arguments() {
        let dialect = Dialect::postgres();
        let mut writer = SqlWriter::new(&dialect);
        writer.push("SELECT * FROM ");
        writer.push_ident("users");
        writer.push(" WHERE ");
        writer.push_ident("id");
        writer.push(" IN (");
        writer.push_args([SqlValue::Int(1), SqlValue::Int(2)]);
        writer.push(")");
        let plan = writer.finish();

        assert_eq!(plan.sql(), "SELECT * FROM \"users\" WHERE \"id\" IN ($1, $2)");
        assert_eq!(plan.args().len(), 2);
    }

    #[test]
    fn test_untyped_array_keeps_numbering() {
        let dialect = Dialect::postgres();
        let mut writer = SqlWriter::new(&dialect);
        writer.push_args([
            SqlValue::Array(vec![]),
            SqlValue::Array(vec![SqlValue::Int(1)]),
        ]);
        let plan = writer.finish();
        assert_eq!(plan.sql(), "'{}', $1");
        assert_eq!(plan.args().len(), 1);
    }

    #[test]
    fn test_positional_placeholders() {
        let dialect = Dialect::sqlite();
        let mut writer = SqlWriter::new(&dialect);
        writer.push_idents(["a", "b"]);
        writer.push(" = ");
        writer.push_arg(SqlValue::Null);
        assert_eq!(writer.finish().sql(), "a, b = ?");
    }
}
