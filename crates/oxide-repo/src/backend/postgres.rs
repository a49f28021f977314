//! Postgres backend.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use oxide_repo_core::{Dialect, DialectCapabilityError, SqlValue, StatementPlan};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgPool, PgRow, PgTypeInfo};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{Column, Postgres, Row as _, Transaction, Type, TypeInfo, ValueRef};

use super::{Backend, ExecResult};
use crate::error::{RepoError, Result};
use crate::row::Row;

/// Runs statements on a Postgres pool.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Creates a backend over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Backend for PostgresBackend {
    const NAME: &'static str = "postgres";

    type Tx = Transaction<'static, Postgres>;

    fn dialect(&self) -> Dialect {
        Dialect::postgres()
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
            last_insert_id: None,
        })
    }
}

/// A NULL whose type the server infers from the statement.
struct UntypedNull;

impl Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl Encode<'_, Postgres> for UntypedNull {
    fn encode_by_ref(
        &self,
        _buf: &mut PgArgumentBuffer,
    ) -> std::result::Result<IsNull, BoxDynError> {
        Ok(IsNull::Yes)
    }
}

fn bind_all(plan: &StatementPlan) -> Result<Query<'_, Postgres, PgArguments>> {
    plan.args()
        .iter()
        .try_fold(sqlx::query(plan.sql()), |query, arg| {
            bind_param_raw(query, arg.clone())
        })
}

/// Binds a SqlValue parameter to a raw query.
fn bind_param_raw(
    query: Query<'_, Postgres, PgArguments>,
    value: SqlValue,
) -> Result<Query<'_, Postgres, PgArguments>> {
    Ok(match value {
        SqlValue::Null => query.bind(UntypedNull),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
        SqlValue::Timestamp(ts) => query.bind(ts),
        SqlValue::Json(json) => query.bind(Json(json)),
        SqlValue::Array(items) => bind_array(query, items)?,
    })
}

/// Binds a flat array, typed after its first non-null element.
fn bind_array(
    query: Query<'_, Postgres, PgArguments>,
    items: Vec<SqlValue>,
) -> Result<Query<'_, Postgres, PgArguments>> {
    fn collect<T>(
        items: Vec<SqlValue>,
        pick: impl Fn(SqlValue) -> Option<T>,
    ) -> Result<Vec<Option<T>>> {
        items
            .into_iter()
            .map(|item| match item {
                SqlValue::Null => Ok(None),
                other => {
                    let found = format!("{other:?}");
                    pick(other)
                        .map(Some)
                        .ok_or_else(|| unsupported(format!("mixed element {found}")))
                }
            })
            .collect()
    }

    let Some(first) = items.iter().find(|item| !item.is_null()).cloned() else {
        return Ok(query.bind(Vec::<Option<String>>::new()));
    };

    Ok(match first {
        SqlValue::Bool(_) => query.bind(collect(items, |v| match v {
            SqlValue::Bool(b) => Some(b),
            _ => None,
        })?),
        SqlValue::Int(_) => query.bind(collect(items, |v| match v {
            SqlValue::Int(i) => Some(i),
            _ => None,
        })?),
        SqlValue::Float(_) => query.bind(collect(items, |v| match v {
            SqlValue::Float(f) => Some(f),
            _ => None,
        })?),
        SqlValue::Text(_) => query.bind(collect(items, |v| match v {
            SqlValue::Text(s) => Some(s),
            _ => None,
        })?),
        SqlValue::Timestamp(_) => query.bind(collect(items, |v| match v {
            SqlValue::Timestamp(ts) => Some(ts),
            _ => None,
        })?),
        other => return Err(unsupported(format!("element {other:?}"))),
    })
}

fn unsupported(reason: String) -> RepoError {
    DialectCapabilityError::UnsupportedArray {
        dialect: PostgresBackend::NAME,
        reason,
    }
    .into()
}

/// Decodes a row by the declared type of each column.
fn decode_row(row: &PgRow) -> Result<Row> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        columns.push(column.name().to_string());
        if row.try_get_raw(index)?.is_null() {
            values.push(SqlValue::Null);
            continue;
        }
        let value = match column.type_info().name() {
            "BOOL" => SqlValue::Bool(row.try_get(index)?),
            "INT2" => SqlValue::Int(row.try_get::<i16, _>(index)?.into()),
            "INT4" => SqlValue::Int(row.try_get::<i32, _>(index)?.into()),
            "INT8" => SqlValue::Int(row.try_get(index)?),
            "FLOAT4" => SqlValue::Float(row.try_get::<f32, _>(index)?.into()),
            "FLOAT8" => SqlValue::Float(row.try_get(index)?),
            "NUMERIC" => numeric(row.try_get::<Decimal, _>(index)?),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => SqlValue::Text(row.try_get(index)?),
            "BYTEA" => SqlValue::Blob(row.try_get(index)?),
            "TIMESTAMPTZ" => SqlValue::Timestamp(row.try_get::<DateTime<Utc>, _>(index)?),
            "TIMESTAMP" => SqlValue::Timestamp(row.try_get::<NaiveDateTime, _>(index)?.and_utc()),
            "DATE" => SqlValue::Timestamp(
                row.try_get::<NaiveDate, _>(index)?
                    .and_time(NaiveTime::default())
                    .and_utc(),
            ),
            "JSON" | "JSONB" => SqlValue::Json(row.try_get(index)?),
            "BOOL[]" => array(row.try_get::<Vec<Option<bool>>, _>(index)?, SqlValue::Bool),
            "INT4[]" => array(row.try_get::<Vec<Option<i32>>, _>(index)?, |i| {
                SqlValue::Int(i.into())
            }),
            "INT8[]" => array(row.try_get::<Vec<Option<i64>>, _>(index)?, SqlValue::Int),
            "FLOAT8[]" => array(row.try_get::<Vec<Option<f64>>, _>(index)?, SqlValue::Float),
            "TEXT[]" | "VARCHAR[]" => {
                array(row.try_get::<Vec<Option<String>>, _>(index)?, SqlValue::Text)
            }
            "TIMESTAMPTZ[]" => array(
                row.try_get::<Vec<Option<DateTime<Utc>>>, _>(index)?,
                SqlValue::Timestamp,
            ),
            other => {
                return Err(RepoError::Decode {
                    column: column.name().to_string(),
                    message: format!("unsupported column type {other}"),
                })
            }
        };
        values.push(value);
    }
    Ok(Row::new(columns, values))
}

/// Whole numbers that fit become integers, the rest floats. Values beyond
/// `f64` keep their decimal text.
fn numeric(value: Decimal) -> SqlValue {
    if value.fract().is_zero() {
        if let Some(int) = value.to_i64() {
            return SqlValue::Int(int);
        }
    }
    value
        .to_f64()
        .map_or_else(|| SqlValue::Text(value.to_string()), SqlValue::Float)
}

fn array<T>(items: Vec<Option<T>>, wrap: impl Fn(T) -> SqlValue) -> SqlValue {
    SqlValue::Array(
        items
            .into_iter()
            .map(|item| item.map_or(SqlValue::Null, &wrap))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_array_rejected() {
        let query = sqlx::query("SELECT $1");
        let Err(err) = bind_array(
            query,
            vec![SqlValue::Int(1), SqlValue::Text(String::from("a"))],
        ) else {
            panic!("mixed array was bound");
        };
        assert!(matches!(
            err,
            RepoError::Core(oxide_repo_core::Error::DialectCapability(
                DialectCapabilityError::UnsupportedArray { dialect: "postgres", .. }
            ))
        ));
    }

    #[test]
    fn test_nested_array_rejected() {
        let query = sqlx::query("SELECT $1");
        assert!(bind_array(query, vec![SqlValue::Array(vec![])]).is_err());
    }

    #[test]
    fn test_numeric_results() {
        // AVG over integers and SUM over bigints come back as NUMERIC.
        assert_eq!(numeric(Decimal::new(150_000, 4)), SqlValue::Int(15));
        assert_eq!(numeric(Decimal::new(155, 1)), SqlValue::Float(15.5));
        assert_eq!(numeric(Decimal::from(i64::MAX)), SqlValue::Int(i64::MAX));
        assert_eq!(
            numeric(Decimal::from(i64::MAX) + Decimal::ONE),
            SqlValue::Float(9_223_372_036_854_775_808.0)
        );
    }

    #[test]
    fn test_null_only_array_binds() {
        let query = sqlx::query("SELECT $1");
        assert!(bind_array(query, vec![SqlValue::Null, SqlValue::Null]).is_ok());
    }
}
