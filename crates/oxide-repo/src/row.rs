//! Backend-neutral result rows.
//!
//! Backends decode their native rows into [`Row`], a list of named
//! [`SqlValue`]s. Records and aggregate destinations then read typed values
//! out of it through [`FromValue`].

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use chrono::{DateTime, NaiveDateTime, Utc};
use oxide_repo_core::SqlValue;

use crate::error::{RepoError, Result};

/// A decoded result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Creates a row from column names and values of the same length.
    #[must_use]
    pub const fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the row has no column.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the raw value of a column.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|index| self.values.get(index))
    }

    /// Reads a column by name.
    pub fn get<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self.value(name).ok_or_else(|| RepoError::Decode {
            column: String::from(name),
            message: String::from("no such column in result set"),
        })?;
        decode(name, value.clone())
    }

    /// Reads a column by position.
    pub fn get_at<T: FromValue>(&self, index: usize) -> Result<T> {
        let value = self.values.get(index).ok_or_else(|| RepoError::Decode {
            column: index.to_string(),
            message: format!("index out of range for row of {} columns", self.len()),
        })?;
        let column = self
            .columns
            .get(index)
            .map_or_else(|| index.to_string(), Clone::clone);
        decode(&column, value.clone())
    }
}

/// Converts a value into `T`, naming `column` on failure.
pub(crate) fn decode<T: FromValue>(column: &str, value: SqlValue) -> Result<T> {
    T::from_value(value).map_err(|message| RepoError::Decode {
        column: String::from(column),
        message,
    })
}

/// Conversion from a decoded column value.
pub trait FromValue: Sized {
    /// Converts the value, or describes why it cannot be.
    fn from_value(value: SqlValue) -> std::result::Result<Self, String>;
}

fn mismatch<T>(expected: &str, value: &SqlValue) -> std::result::Result<T, String> {
    Err(format!("expected {expected}, found {value:?}"))
}

impl FromValue for SqlValue {
    fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
        match value {
            SqlValue::Int(i) => Ok(i),
            SqlValue::Bool(b) => Ok(Self::from(b)),
            other => mismatch("an integer", &other),
        }
    }
}

macro_rules! impl_integer_from_value {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
                    match value {
                        SqlValue::Int(i) => <$ty>::try_from(i).map_err(|e| format!("{i}: {e}")),
                        // Values past i64::MAX are stored as decimal text.
                        SqlValue::Text(s) => s.parse::<$ty>().map_err(|e| format!("{s:?}: {e}")),
                        other => mismatch("an integer", &other),
                    }
                }
            }
        )*
    };
}

impl_integer_from_value!(i8, i16, i32, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
        match value {
            SqlValue::Float(f) => Ok(f),
            #[allow(clippy::cast_precision_loss)]
            SqlValue::Int(i) => Ok(i as Self),
            other => mismatch("a float", &other),
        }
    }
}

impl FromValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
        f64::from_value(value).map(|f| f as Self)
    }
}

impl FromValue for bool {
    fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
        match value {
            SqlValue::Bool(b) => Ok(b),
            SqlValue::Int(i) => Ok(i != 0),
            other => mismatch("a boolean", &other),
        }
    }
}

impl FromValue for String {
    fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
        match value {
            SqlValue::Text(s) => Ok(s),
            other => mismatch("text", &other),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
        match value {
            SqlValue::Blob(b) => Ok(b),
            SqlValue::Text(s) => Ok(s.into_bytes()),
            other => mismatch("a blob", &other),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
        match value {
            SqlValue::Timestamp(ts) => Ok(ts),
            SqlValue::Text(s) => parse_timestamp(&s),
            other => mismatch("a timestamp", &other),
        }
    }
}

/// SQLite keeps timestamps as text, either RFC 3339 or `CURRENT_TIMESTAMP`
/// form.
fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("{s:?} is not a timestamp: {e}"))
}

impl FromValue for serde_json::Value {
    fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
        match value {
            SqlValue::Json(json) => Ok(json),
            SqlValue::Text(s) => serde_json::from_str(&s).map_err(|e| e.to_string()),
            other => Ok(other.into_json()),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

macro_rules! impl_list_from_value {
    ($($ty:ty),*) => {
        $(
            impl FromValue for Vec<$ty> {
                fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
                    match value {
                        SqlValue::Array(items) => items.into_iter().map(<$ty>::from_value).collect(),
                        SqlValue::Json(serde_json::Value::Array(items)) => items
                            .into_iter()
                            .map(|item| <$ty>::from_value(json_to_value(item)))
                            .collect(),
                        other => mismatch("an array", &other),
                    }
                }
            }
        )*
    };
}

impl_list_from_value!(String, i64, i32, f64, bool, Option<String>, Option<i64>);

fn fixed<T, const N: usize>(items: Vec<T>) -> std::result::Result<[T; N], String> {
    items
        .try_into()
        .map_err(|items: Vec<T>| format!("expected {N} elements, found {}", items.len()))
}

impl<const N: usize> FromValue for [u8; N] {
    fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
        fixed(Vec::<u8>::from_value(value)?)
    }
}

macro_rules! impl_fixed_array_from_value {
    ($($ty:ty),*) => {
        $(
            impl<const N: usize> FromValue for [$ty; N] {
                fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
                    fixed(Vec::<$ty>::from_value(value)?)
                }
            }
        )*
    };
}

impl_fixed_array_from_value!(String, i64, i32, f64, bool);

impl<V: FromValue, S: BuildHasher + Default> FromValue for HashMap<String, V, S> {
    fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
        json_object(value)?
            .into_iter()
            .map(|(key, item)| Ok((key, V::from_value(json_to_value(item))?)))
            .collect()
    }
}

impl<V: FromValue> FromValue for BTreeMap<String, V> {
    fn from_value(value: SqlValue) -> std::result::Result<Self, String> {
        json_object(value)?
            .into_iter()
            .map(|(key, item)| Ok((key, V::from_value(json_to_value(item))?)))
            .collect()
    }
}

fn json_object(
    value: SqlValue,
) -> std::result::Result<serde_json::Map<String, serde_json::Value>, String> {
    match <serde_json::Value as FromValue>::from_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(format!("expected a JSON object, found {other}")),
    }
}

/// Maps a JSON document node onto the closest scalar value.
#[must_use]
pub fn json_to_value(json: serde_json::Value) -> SqlValue {
    match json {
        serde_json::Value::Null => SqlValue::Null,
        serde_json::Value::Bool(b) => SqlValue::Bool(b),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Int)
            .or_else(|| n.as_f64().map(SqlValue::Float))
            .unwrap_or_else(|| SqlValue::Text(n.to_string())),
        serde_json::Value::String(s) => SqlValue::Text(s),
        serde_json::Value::Array(items) => {
            SqlValue::Array(items.into_iter().map(json_to_value).collect())
        }
        object @ serde_json::Value::Object(_) => SqlValue::Json(object),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn row() -> Row {
        Row::new(
            vec![
                String::from("id"),
                String::from("name"),
                String::from("age"),
                String::from("created_at"),
            ],
            vec![
                SqlValue::Int(7),
                SqlValue::Text(String::from("alice")),
                SqlValue::Null,
                SqlValue::Text(String::from("2024-03-01 10:20:30")),
            ],
        )
    }

    #[test]
    fn test_get_by_name_and_position() {
        let row = row();
        assert_eq!(row.len(), 4);
        assert_eq!(row.get::<i64>("id").unwrap(), 7);
        assert_eq!(row.get_at::<String>(1).unwrap(), "alice");
        assert_eq!(row.get::<Option<i32>>("age").unwrap(), None);
        assert_eq!(
            row.get::<DateTime<Utc>>("created_at").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 30).unwrap()
        );
    }

    #[test]
    fn test_decode_errors_name_the_column() {
        let row = row();
        match row.get::<i64>("name").unwrap_err() {
            RepoError::Decode { column, .. } => assert_eq!(column, "name"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            row.get::<i64>("missing").unwrap_err(),
            RepoError::Decode { .. }
        ));
        assert!(matches!(
            row.get_at::<i64>(9).unwrap_err(),
            RepoError::Decode { .. }
        ));
    }

    #[test]
    fn test_integer_narrowing() {
        assert_eq!(i32::from_value(SqlValue::Int(42)).unwrap(), 42);
        assert!(u8::from_value(SqlValue::Int(300)).is_err());
        assert_eq!(
            u64::from_value(SqlValue::Text(String::from("18446744073709551615"))).unwrap(),
            u64::MAX
        );
        assert!(bool::from_value(SqlValue::Int(1)).unwrap());
    }

    #[test]
    fn test_rfc3339_timestamp() {
        let ts = DateTime::<Utc>::from_value(SqlValue::Text(String::from(
            "2024-03-01T10:20:30+02:00",
        )))
        .unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 1, 8, 20, 30).unwrap());
    }

    #[test]
    fn test_lists_and_maps() {
        let tags = Vec::<String>::from_value(SqlValue::Array(vec![
            SqlValue::Text(String::from("a")),
            SqlValue::Text(String::from("b")),
        ]))
        .unwrap();
        assert_eq!(tags, vec!["a", "b"]);

        let scores: HashMap<String, i64> =
            FromValue::from_value(SqlValue::Json(serde_json::json!({"x": 1, "y": 2}))).unwrap();
        assert_eq!(scores["y"], 2);

        let labels: BTreeMap<String, String> =
            FromValue::from_value(SqlValue::Text(String::from(r#"{"k":"v"}"#))).unwrap();
        assert_eq!(labels["k"], "v");
    }

    #[test]
    fn test_fixed_arrays() {
        let digest = <[u8; 2]>::from_value(SqlValue::Blob(vec![0xAB, 0xCD])).unwrap();
        assert_eq!(digest, [0xAB, 0xCD]);
        assert!(<[u8; 4]>::from_value(SqlValue::Blob(vec![1])).is_err());

        let pair = <[i64; 2]>::from_value(SqlValue::Array(vec![
            SqlValue::Int(3),
            SqlValue::Int(4),
        ]))
        .unwrap();
        assert_eq!(pair, [3, 4]);
    }

    #[test]
    fn test_json_to_value() {
        assert_eq!(json_to_value(serde_json::json!(1.5)), SqlValue::Float(1.5));
        assert_eq!(
            json_to_value(serde_json::json!([1, null])),
            SqlValue::Array(vec![SqlValue::Int(1), SqlValue::Null])
        );
    }
}
