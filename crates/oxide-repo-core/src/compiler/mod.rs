//! Dialect compiler.
//!
//! A [`Compiler`] binds a [`Schema`] to a [`Dialect`] and turns request
//! values into [`StatementPlan`]s. Column selection, predicate translation
//! and write-column filtering are shared; the dialect only decides
//! placeholders, quoting, identity retrieval and container binding.
//!
//! # Example
//!
//! ```rust
//! use oxide_repo_core::builder::Query;
//! use oxide_repo_core::{build_schema, ColumnDescriptor, Compiler, Dialect, Predicate, RecordDescriptor};
//!
//! let schema = build_schema(
//!     &RecordDescriptor::new("user", "users")
//!         .column(ColumnDescriptor::of::<i64>("id").ident().auto())
//!         .column(ColumnDescriptor::of::<i32>("age")),
//! )
//! .unwrap();
//!
//! let compiler = Compiler::new(&schema, Dialect::postgres());
//! let plan = compiler
//!     .select(&Query::new().filter(Predicate::eq("age", 30)).limit(10))
//!     .unwrap();
//!
//! assert_eq!(
//!     plan.sql(),
//!     r#"SELECT "id", "age" FROM "users" WHERE "age" = $1 LIMIT 10"#
//! );
//! ```

mod plan;
mod writer;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use plan::StatementPlan;
use writer::SqlWriter;

use crate::aggregate::AggregateSet;
use crate::builder::value::SqlValue;
use crate::builder::{Aggregation, Assignment, Create, Delete, Query, Update};
use crate::clause::{Accepts, Clause, Clauses};
use crate::dialect::Dialect;
use crate::error::{Error, Result, SchemaError};
use crate::predicate::{Operand, Predicate, PredicateSet};
use crate::schema::{Column, Schema};
use crate::sort::SortSet;

/// Which assigned values make it into INSERT and UPDATE column lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Assigned values equal to their type's zero value are left out.
    #[default]
    OmitZero,
    /// Every assigned value is written, zero or not.
    KeepExplicit,
}

/// Compiler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Write-column filtering for single-row inserts and updates.
    #[serde(default)]
    pub write_policy: WritePolicy,
}

impl CompileOptions {
    /// Sets the write policy.
    #[must_use]
    pub const fn write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }
}

/// Compiles requests against one schema for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'s> {
    schema: &'s Schema,
    dialect: Dialect,
    options: CompileOptions,
}

impl<'s> Compiler<'s> {
    /// Creates a compiler with default options.
    #[must_use]
    pub const fn new(schema: &'s Schema, dialect: Dialect) -> Self {
        Self {
            schema,
            dialect,
            options: CompileOptions {
                write_policy: WritePolicy::OmitZero,
            },
        }
    }

    /// Replaces the options.
    #[must_use]
    pub const fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the schema.
    #[must_use]
    pub const fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Returns the dialect.
    #[must_use]
    pub const fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Checks that the dialect can store every column of the schema.
    pub fn validate_schema(&self) -> Result<()> {
        self.dialect.check_schema(self.schema)?;
        Ok(())
    }

    /// Compiles a single-row insert.
    ///
    /// Auto columns cannot be assigned. With no column left to write the
    /// statement inserts a row of defaults.
    pub fn insert_one(&self, create: &Create) -> Result<StatementPlan> {
        let values = self.write_values(create.values(), self.options.write_policy)?;

        let mut w = SqlWriter::new(&self.dialect);
        w.push("INSERT INTO ");
        w.push_ident(self.schema.collection());
        if values.is_empty() {
            w.push(" DEFAULT VALUES");
        } else {
            w.push(" (");
            w.push_idents(values.iter().map(|(column, _)| column.name.as_str()));
            w.push(") VALUES (");
            w.push_args(values.into_iter().map(|(_, value)| value));
            w.push(")");
        }
        self.push_returning(&mut w);
        Ok(w.finish())
    }

    /// Compiles a multi-row insert.
    ///
    /// The column set comes from the first row and every other row must set
    /// the same columns. Values are written as given, whatever the write
    /// policy. An empty batch compiles to nothing.
    pub fn insert_many(&self, rows: &[Create]) -> Result<Option<StatementPlan>> {
        let Some(first) = rows.first() else {
            return Ok(None);
        };

        let columns: Vec<&Column> = self
            .write_values(first.values(), WritePolicy::KeepExplicit)?
            .into_iter()
            .map(|(column, _)| column)
            .collect();
        let expected: BTreeSet<&str> = columns.iter().map(|c| c.name.as_str()).collect();

        for (index, row) in rows.iter().enumerate().skip(1) {
            let found: BTreeSet<&str> = row.values().iter().map(|a| a.column.as_str()).collect();
            if found != expected {
                return Err(Error::ColumnSetMismatch {
                    row: index,
                    expected: columns.iter().map(|c| c.name.clone()).collect(),
                    found: row.values().iter().map(|a| a.column.clone()).collect(),
                });
            }
        }

        if columns.is_empty() {
            if rows.len() > 1 {
                return Err(Error::EmptyBatchColumns {
                    collection: self.schema.collection().to_string(),
                });
            }
            return self.insert_one(first).map(Some);
        }

        let mut w = SqlWriter::new(&self.dialect);
        w.push("INSERT INTO ");
        w.push_ident(self.schema.collection());
        w.push(" (");
        w.push_idents(columns.iter().map(|c| c.name.as_str()));
        w.push(") VALUES ");
        for (index, row) in rows.iter().enumerate() {
            if index > 0 {
                w.push(", ");
            }
            let mut values = Vec::with_capacity(columns.len());
            for column in &columns {
                let value = row
                    .values()
                    .iter()
                    .find(|a| a.column == column.name)
                    .map_or(SqlValue::Null, |a| a.value.clone());
                values.push(self.dialect.adapt(column, value)?);
            }
            w.push("(");
            w.push_args(values);
            w.push(")");
        }
        self.push_returning(&mut w);
        Ok(Some(w.finish()))
    }

    /// Compiles a select of every column, with optional paging.
    pub fn select(&self, query: &Query) -> Result<StatementPlan> {
        self.select_plan(
            query.clauses(),
            "select",
            Some((query.limit_value(), query.offset_value())),
        )
    }

    /// Compiles a select expecting a single row. Paging is never emitted.
    pub fn select_one(&self, query: &Query) -> Result<StatementPlan> {
        self.select_plan(query.clauses(), "select one", None)
    }

    /// Compiles an update of the matching rows.
    pub fn update(&self, update: &Update) -> Result<StatementPlan> {
        let clauses = Clauses::split_for(
            update.clauses(),
            Accepts {
                operation: "update",
                sorts: false,
                aggregates: false,
            },
        )?;
        let values = self.write_values(update.values(), self.options.write_policy)?;
        if values.is_empty() {
            return Err(Error::EmptyUpdate {
                collection: self.schema.collection().to_string(),
            });
        }

        let mut w = SqlWriter::new(&self.dialect);
        w.push("UPDATE ");
        w.push_ident(self.schema.collection());
        w.push(" SET ");
        for (index, (column, value)) in values.into_iter().enumerate() {
            if index > 0 {
                w.push(", ");
            }
            w.push_ident(&column.name);
            w.push(" = ");
            w.push_arg(value);
        }
        self.push_where(&mut w, &clauses.predicates)?;
        Ok(w.finish())
    }

    /// Compiles a delete of the matching rows.
    ///
    /// Without predicates every row of the collection is deleted.
    pub fn delete(&self, delete: &Delete) -> Result<StatementPlan> {
        let clauses = Clauses::split_for(
            delete.clauses(),
            Accepts {
                operation: "delete",
                sorts: false,
                aggregates: false,
            },
        )?;

        let mut w = SqlWriter::new(&self.dialect);
        w.push("DELETE FROM ");
        w.push_ident(self.schema.collection());
        self.push_where(&mut w, &clauses.predicates)?;
        Ok(w.finish())
    }

    /// Compiles an aggregate select.
    ///
    /// Each aggregate becomes `FUNC(column) AS func_column`; the
    /// pass-through emits the bare column.
    pub fn aggregate(&self, aggregation: &Aggregation) -> Result<StatementPlan> {
        let clauses = Clauses::split_for(
            aggregation.clauses(),
            Accepts {
                operation: "aggregate",
                sorts: true,
                aggregates: true,
            },
        )?;
        let aggregates = &clauses.aggregates;
        if aggregates.all().is_empty() {
            return Err(Error::EmptyAggregate {
                collection: self.schema.collection().to_string(),
            });
        }

        let mut w = SqlWriter::new(&self.dialect);
        w.push("SELECT ");
        for (index, aggregate) in aggregates.all().iter().enumerate() {
            let column = self.schema.require(&aggregate.column)?;
            if index > 0 {
                w.push(", ");
            }
            match aggregate.function.as_sql() {
                Some(function) => {
                    w.push(function);
                    w.push("(");
                    w.push_ident(&column.name);
                    w.push(") AS ");
                    w.push(&aggregate.alias());
                }
                None => w.push_ident(&column.name),
            }
        }
        w.push(" FROM ");
        w.push_ident(self.schema.collection());
        self.push_where(&mut w, &clauses.predicates)?;

        if !aggregates.groups().is_empty() {
            for group in aggregates.groups() {
                self.schema.require(group)?;
            }
            w.push(" GROUP BY ");
            w.push_idents(aggregates.groups().iter().map(String::as_str));
        }

        self.push_order_by(&mut w, &clauses.sorts, Some(aggregates))?;
        Ok(w.finish())
    }

    fn select_plan(
        &self,
        clauses: &[Clause],
        operation: &'static str,
        page: Option<(u64, u64)>,
    ) -> Result<StatementPlan> {
        let clauses = Clauses::split_for(
            clauses,
            Accepts {
                operation,
                sorts: true,
                aggregates: false,
            },
        )?;

        let mut w = SqlWriter::new(&self.dialect);
        w.push("SELECT ");
        w.push_idents(self.schema.columns().iter().map(|c| c.name.as_str()));
        w.push(" FROM ");
        w.push_ident(self.schema.collection());
        self.push_where(&mut w, &clauses.predicates)?;
        self.push_order_by(&mut w, &clauses.sorts, None)?;

        if let Some((limit, offset)) = page {
            if limit > 0 {
                w.push(&format!(" LIMIT {limit}"));
            } else if offset > 0 && self.dialect.offset_needs_limit() {
                w.push(" LIMIT -1");
            }
            if offset > 0 {
                w.push(&format!(" OFFSET {offset}"));
            }
        }
        Ok(w.finish())
    }

    /// Resolves assignments to writable columns in schema order, applying
    /// the write policy and the dialect's value adapters.
    fn write_values(
        &self,
        assignments: &[Assignment],
        policy: WritePolicy,
    ) -> Result<Vec<(&'s Column, SqlValue)>> {
        for assignment in assignments {
            let column = self.schema.require(&assignment.column)?;
            if column.is_auto {
                return Err(SchemaError::AutoColumnWrite {
                    collection: self.schema.collection().to_string(),
                    column: column.name.clone(),
                }
                .into());
            }
        }

        let mut values = vec![];
        for column in self.schema.write_columns() {
            let Some(assignment) = assignments.iter().find(|a| a.column == column.name) else {
                continue;
            };
            if policy == WritePolicy::OmitZero && assignment.value.is_zero() {
                continue;
            }
            values.push((column, self.dialect.adapt(column, assignment.value.clone())?));
        }
        Ok(values)
    }

    fn push_returning(&self, w: &mut SqlWriter<'_>) {
        if self.dialect.insert_returns_identity() {
            w.push(" RETURNING ");
            w.push_ident(&self.schema.ident().name);
        }
    }

    fn push_where(&self, w: &mut SqlWriter<'_>, predicates: &PredicateSet) -> Result<()> {
        let mut first = true;
        for predicate in predicates.all() {
            let column = self.schema.require(&predicate.column)?;
            if predicate.operator.is_membership()
                && matches!(&predicate.operand, Operand::List(values) if values.is_empty())
            {
                continue;
            }

            w.push(if first { " WHERE " } else { " AND " });
            first = false;
            self.push_predicate(w, column, predicate)?;
        }
        Ok(())
    }

    fn push_predicate(&self, w: &mut SqlWriter<'_>, column: &Column, predicate: &Predicate) -> Result<()> {
        w.push_ident(&column.name);
        w.push(" ");
        w.push(predicate.operator.as_sql());
        if predicate.operator.is_unary() {
            return Ok(());
        }

        let membership = predicate.operator.is_membership();
        w.push(if membership { " (" } else { " " });
        match &predicate.operand {
            Operand::Value(value) => w.push_arg(self.dialect.adapt(column, value.clone())?),
            Operand::Null => w.push_arg(SqlValue::Null),
            Operand::List(values) if membership => {
                let mut adapted = Vec::with_capacity(values.len());
                for value in values {
                    adapted.push(self.dialect.adapt(column, value.clone())?);
                }
                w.push_args(adapted);
            }
            Operand::List(values) => {
                w.push_arg(self.dialect.adapt(column, SqlValue::Array(values.clone()))?);
            }
            Operand::Column(other) => {
                if !column.is_comparable {
                    return Err(SchemaError::NotComparable {
                        collection: self.schema.collection().to_string(),
                        column: column.name.clone(),
                    }
                    .into());
                }
                let other = self.schema.require(other)?;
                w.push_ident(&other.name);
            }
        }
        if membership {
            w.push(")");
        }
        Ok(())
    }

    fn push_order_by(
        &self,
        w: &mut SqlWriter<'_>,
        sorts: &SortSet,
        aggregates: Option<&AggregateSet>,
    ) -> Result<()> {
        for (index, sort) in sorts.all().iter().enumerate() {
            w.push(if index == 0 { " ORDER BY " } else { ", " });
            if aggregates.is_some_and(|set| set.has_alias(&sort.column)) {
                w.push(&sort.column);
            } else {
                let column = self.schema.require(&sort.column)?;
                w.push_ident(&column.name);
            }
            w.push(" ");
            w.push(sort.direction.as_sql());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::predicate::Operator;
    use crate::schema::{build_schema, ColumnDescriptor, RecordDescriptor};
    use crate::sort::Sort;

    fn schema() -> Schema {
        build_schema(
            &RecordDescriptor::new("user", "users")
                .column(ColumnDescriptor::of::<i64>("id").ident().auto())
                .column(ColumnDescriptor::of::<String>("name"))
                .column(ColumnDescriptor::of::<i32>("age").comparable())
                .column(ColumnDescriptor::of::<i32>("min_age")),
        )
        .unwrap()
    }

    #[test]
    fn test_insert_one_omits_zero_values() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::postgres());
        let plan = compiler
            .insert_one(&Create::new().set("name", "").set("age", 30))
            .unwrap();
        assert_eq!(
            plan.sql(),
            r#"INSERT INTO "users" ("age") VALUES ($1) RETURNING "id""#
        );
        assert_eq!(plan.args(), [SqlValue::Int(30)]);
    }

    #[test]
    fn test_insert_one_keep_explicit() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::sqlite())
            .with_options(CompileOptions::default().write_policy(WritePolicy::KeepExplicit));
        let plan = compiler
            .insert_one(&Create::new().set("age", 0).set("name", ""))
            .unwrap();
        assert_eq!(plan.sql(), "INSERT INTO users (name, age) VALUES (?, ?)");
        assert_eq!(
            plan.args(),
            [SqlValue::Text(String::new()), SqlValue::Int(0)]
        );
    }

    #[test]
    fn test_insert_rejects_auto_column() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::sqlite());
        let err = compiler.insert_one(&Create::new().set("id", 3)).unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::AutoColumnWrite { .. })
        ));
    }

    #[test]
    fn test_insert_many_column_mismatch() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::postgres());
        let rows = [
            Create::new().set("name", "a").set("age", 1),
            Create::new().set("name", "b"),
        ];
        let err = compiler.insert_many(&rows).unwrap_err();
        assert!(matches!(err, Error::ColumnSetMismatch { row: 1, .. }));
    }

    #[test]
    fn test_insert_many_keeps_zero_values() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::sqlite());
        let rows = [
            Create::new().set("name", "a").set("age", 0),
            Create::new().set("age", 7).set("name", "b"),
        ];
        let plan = compiler.insert_many(&rows).unwrap().unwrap();
        assert_eq!(plan.sql(), "INSERT INTO users (name, age) VALUES (?, ?), (?, ?)");
        assert_eq!(
            plan.args(),
            [
                SqlValue::Text(String::from("a")),
                SqlValue::Int(0),
                SqlValue::Text(String::from("b")),
                SqlValue::Int(7),
            ]
        );
    }

    #[test]
    fn test_insert_many_without_columns() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::sqlite());
        let single = compiler.insert_many(&[Create::new()]).unwrap().unwrap();
        assert_eq!(single.sql(), "INSERT INTO users DEFAULT VALUES");

        let err = compiler
            .insert_many(&[Create::new(), Create::new()])
            .unwrap_err();
        assert!(matches!(err, Error::EmptyBatchColumns { .. }));
    }

    #[test]
    fn test_select_where_and_order() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::postgres());
        let query = Query::new()
            .filter(Predicate::gt_or_eq("age", 18))
            .filter(Predicate::not_eq("name", "bob"))
            .filter(Predicate::is_not_null("name"))
            .order_by(Sort::desc("age"))
            .order_by(Sort::asc("name"));
        let plan = compiler.select(&query).unwrap();
        assert_eq!(
            plan.sql(),
            r#"SELECT "id", "name", "age", "min_age" FROM "users" WHERE "age" >= $1 AND "name" <> $2 AND "name" IS NOT NULL ORDER BY "age" DESC, "name" ASC"#
        );
        assert_eq!(
            plan.args(),
            [SqlValue::Int(18), SqlValue::Text(String::from("bob"))]
        );
    }

    #[test]
    fn test_in_lists() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::sqlite());
        let query = Query::new()
            .filter(Predicate::in_list("age", [1, 2, 3]))
            .filter(Predicate::not_in("name", Vec::<String>::new()))
            .filter(Predicate::not_in("name", ["x"]));
        let plan = compiler.select(&query).unwrap();
        assert_eq!(
            plan.sql(),
            "SELECT id, name, age, min_age FROM users WHERE age IN (?, ?, ?) AND name NOT IN (?)"
        );
        assert_eq!(plan.args().len(), 4);
    }

    #[test]
    fn test_column_comparison() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::postgres());
        let plan = compiler
            .select_one(&Query::new().filter(Predicate::columns("age", Operator::Gt, "min_age")))
            .unwrap();
        assert!(plan.sql().ends_with(r#"WHERE "age" > "min_age""#));
        assert!(plan.args().is_empty());

        let err = compiler
            .select_one(&Query::new().filter(Predicate::columns("name", Operator::Eq, "age")))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::NotComparable { .. })
        ));
    }

    #[test]
    fn test_unknown_column() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::postgres());
        let err = compiler
            .delete(&Delete::new().filter(Predicate::eq("nope", 1)))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_offset_without_limit() {
        let schema = schema();
        let sqlite = Compiler::new(&schema, Dialect::sqlite())
            .select(&Query::new().offset(5))
            .unwrap();
        assert!(sqlite.sql().ends_with(" LIMIT -1 OFFSET 5"));

        let postgres = Compiler::new(&schema, Dialect::postgres())
            .select(&Query::new().offset(5))
            .unwrap();
        assert!(postgres.sql().ends_with(r#"FROM "users" OFFSET 5"#));
    }

    #[test]
    fn test_update() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::postgres());
        let plan = compiler
            .update(
                &Update::new()
                    .set("name", "alice")
                    .set("age", 0)
                    .filter(Predicate::eq("id", 7)),
            )
            .unwrap();
        assert_eq!(
            plan.sql(),
            r#"UPDATE "users" SET "name" = $1 WHERE "id" = $2"#
        );
        assert_eq!(
            plan.args(),
            [SqlValue::Text(String::from("alice")), SqlValue::Int(7)]
        );
    }

    #[test]
    fn test_empty_update() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::postgres());
        let err = compiler.update(&Update::new().set("age", 0)).unwrap_err();
        assert!(matches!(err, Error::EmptyUpdate { .. }));
    }

    #[test]
    fn test_update_rejects_order_by() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::postgres());
        let update = Update::new()
            .set("name", "a")
            .clauses_from([Clause::from(Sort::asc("name"))]);
        assert!(matches!(
            compiler.update(&update).unwrap_err(),
            Error::UnexpectedClause {
                operation: "update",
                ..
            }
        ));
    }

    #[test]
    fn test_unconditional_delete() {
        let schema = schema();
        let plan = Compiler::new(&schema, Dialect::sqlite())
            .delete(&Delete::new())
            .unwrap();
        assert_eq!(plan.sql(), "DELETE FROM users");
        assert!(plan.args().is_empty());
    }

    #[test]
    fn test_aggregate_with_alias_sort() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::postgres());
        let aggregation = Aggregation::new()
            .aggregate(Aggregate::avg("age"))
            .aggregate(Aggregate::column("name"))
            .filter(Predicate::gt("age", 10))
            .group_by("name")
            .order_by(Sort::desc("avg_age"));
        let plan = compiler.aggregate(&aggregation).unwrap();
        assert_eq!(
            plan.sql(),
            r#"SELECT AVG("age") AS avg_age, "name" FROM "users" WHERE "age" > $1 GROUP BY "name" ORDER BY avg_age DESC"#
        );
    }

    #[test]
    fn test_empty_aggregate() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::postgres());
        let err = compiler
            .aggregate(&Aggregation::new().group_by("name"))
            .unwrap_err();
        assert!(matches!(err, Error::EmptyAggregate { .. }));
    }

    #[test]
    fn test_select_rejects_aggregates() {
        let schema = schema();
        let compiler = Compiler::new(&schema, Dialect::postgres());
        let query = Query::new().clause(Aggregate::count("id"));
        assert!(matches!(
            compiler.select(&query).unwrap_err(),
            Error::UnexpectedClause {
                operation: "select",
                clause: "aggregate"
            }
        ));
    }
}
