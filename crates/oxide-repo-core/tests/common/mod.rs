#![allow(dead_code)]

use chrono::{DateTime, Utc};
use oxide_repo_core::{
    build_schema, ColumnDescriptor, Compiler, Dialect, RecordDescriptor, Schema, StatementPlan,
};

/// The `users` record used across the compile tests.
pub fn users_record() -> RecordDescriptor {
    RecordDescriptor::new("user", "users")
        .column(ColumnDescriptor::of::<i64>("id").ident().auto())
        .column(ColumnDescriptor::of::<String>("email"))
        .column(ColumnDescriptor::of::<String>("name"))
        .column(ColumnDescriptor::of::<Option<i32>>("age"))
        .column(ColumnDescriptor::of::<Option<String>>("group_res"))
        .column(ColumnDescriptor::of::<Option<DateTime<Utc>>>("updated_at").comparable())
        .column(ColumnDescriptor::of::<DateTime<Utc>>("created_at").auto().comparable())
}

pub fn users() -> Schema {
    build_schema(&users_record()).unwrap_or_else(|e| panic!("users schema: {e}"))
}

pub fn postgres(schema: &Schema) -> Compiler<'_> {
    Compiler::new(schema, Dialect::postgres())
}

pub fn sqlite(schema: &Schema) -> Compiler<'_> {
    Compiler::new(schema, Dialect::sqlite())
}

/// Rewrites a Postgres statement into its SQLite form: `$N` becomes `?` and
/// double-quoted identifiers lose their quotes.
pub fn as_sqlite(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {}
            '$' => {
                while chars.peek().is_some_and(char::is_ascii_digit) {
                    chars.next();
                }
                out.push('?');
            }
            other => out.push(other),
        }
    }
    out
}

pub fn assert_same_statement(postgres: &StatementPlan, sqlite: &StatementPlan) {
    assert_eq!(as_sqlite(postgres.sql()), sqlite.sql());
    assert_eq!(postgres.args(), sqlite.args());
}
