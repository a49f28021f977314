//! SQLite backend.

use oxide_repo_core::{Dialect, DialectCapabilityError, SqlValue, StatementPlan};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, Transaction, TypeInfo, ValueRef};

use super::{Backend, ExecResult};
use crate::error::Result;
use crate::row::Row;

/// Runs statements on a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Creates a backend over an existing pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl Backend for SqliteBackend {
    const NAME: &'static str = "sqlite";

    type Tx = Transaction<'static, Sqlite>;

    fn dialect(&self) -> Dialect {
        Dialect::sqlite()
    }

    async fn begin(&self) -> Result<Self::Tx> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> Result<()> {
        Ok(tx.commit().await?)
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<()> {
        Ok(tx.rollback().await?)
    }

    async fn query(&self, tx: &mut Self::Tx, plan: &StatementPlan) -> Result<Vec<Row>> {
        let rows = bind_all(plan)?.fetch_all(&mut **tx).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn exec(&self, tx: &mut Self::Tx, plan: &StatementPlan) -> Result<ExecResult> {
        let done = bind_all(plan)?.execute(&mut **tx).await?;
        Ok(ExecResult {
            rows_affected: done.rows_affected(),
            last_insert_id: Some(done.last_insert_rowid()),
        })
    }
}

fn bind_all(plan: &StatementPlan) -> Result<Query<'_, Sqlite, SqliteArguments<'_>>> {
    plan.args()
        .iter()
        .try_fold(sqlx::query(plan.sql()), |query, arg| {
            bind_param_raw(query, arg.clone())
        })
}

/// Binds a SqlValue parameter to a raw query.
fn bind_param_raw<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> Result<Query<'q, Sqlite, SqliteArguments<'q>>> {
    Ok(match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
        SqlValue::Timestamp(ts) => query.bind(ts),
        SqlValue::Json(json) => query.bind(json.to_string()),
        SqlValue::Array(_) => {
            return Err(DialectCapabilityError::UnsupportedArray {
                dialect: SqliteBackend::NAME,
                reason: String::from("sqlite has no array type"),
            }
            .into())
        }
    })
}

/// Decodes a row by the storage class of each value.
fn decode_row(row: &SqliteRow) -> Result<Row> {
    let columns = row.columns().iter().map(|c| c.name().to_string()).collect();
    let mut values = Vec::with_capacity(row.len());
    for index in 0..row.len() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" => SqlValue::Int(row.try_get_unchecked(index)?),
                "REAL" => SqlValue::Float(row.try_get_unchecked(index)?),
                "BLOB" => SqlValue::Blob(row.try_get_unchecked(index)?),
                _ => SqlValue::Text(row.try_get_unchecked(index)?),
            }
        };
        values.push(value);
    }
    Ok(Row::new(columns, values))
}
