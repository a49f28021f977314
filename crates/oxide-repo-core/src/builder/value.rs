//! SQL values and parameter handling.
//!
//! Every value that reaches a statement travels as a bound argument; the
//! compiler never splices caller data into SQL text. The one literal it
//! writes is the element-less array, which carries no caller data.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};

/// A SQL value that can be used as a statement argument.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// Timestamp value.
    Timestamp(DateTime<Utc>),
    /// Homogeneous list bound through a SQL array adapter.
    Array(Vec<SqlValue>),
    /// Document bound through a JSON adapter.
    Json(serde_json::Value),
}

impl SqlValue {
    /// Builds an array value from anything convertible.
    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToSqlValue,
    {
        Self::Array(items.into_iter().map(ToSqlValue::to_sql_value).collect())
    }

    /// Returns whether this is the zero value of its type.
    ///
    /// Zero values are `NULL`, `false`, `0`, `0.0`, the empty string, and
    /// empty blobs, arrays and documents. The zero timestamp is the Unix
    /// epoch, the `Default` of `DateTime<Utc>`.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !*b,
            Self::Int(n) => *n == 0,
            Self::Float(f) => *f == 0.0,
            Self::Text(s) => s.is_empty(),
            Self::Blob(b) => b.is_empty(),
            Self::Timestamp(ts) => *ts == DateTime::<Utc>::default(),
            Self::Array(items) => items.is_empty(),
            Self::Json(doc) => match doc {
                serde_json::Value::Null => true,
                serde_json::Value::Object(map) => map.is_empty(),
                serde_json::Value::Array(items) => items.is_empty(),
                _ => false,
            },
        }
    }

    /// Converts the value into a JSON document.
    ///
    /// Blobs become arrays of bytes, timestamps RFC 3339 strings, and
    /// non-finite floats `null`.
    #[must_use]
    pub fn into_json(self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(b),
            Self::Int(n) => Value::from(n),
            Self::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s),
            Self::Blob(b) => Value::Array(b.into_iter().map(Value::from).collect()),
            Self::Timestamp(ts) => Value::String(ts.to_rfc3339()),
            Self::Array(items) => Value::Array(items.into_iter().map(Self::into_json).collect()),
            Self::Json(doc) => doc,
        }
    }

    /// Returns whether this value is NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the SQL representation for inline use (escaped).
    ///
    /// **Warning**: only used for diagnostics; statements bind arguments.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => quote_text(s),
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
            Self::Timestamp(ts) => quote_text(&ts.to_rfc3339()),
            Self::Array(items) => {
                let inner: Vec<String> = items.iter().map(Self::to_sql_inline).collect();
                format!("ARRAY[{}]", inner.join(", "))
            }
            Self::Json(doc) => quote_text(&doc.to_string()),
        }
    }
}

fn quote_text(s: &str) -> String {
    // Escape single quotes by doubling them
    let escaped = s.replace('\'', "''");
    format!("'{escaped}'")
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_inline())
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

macro_rules! impl_small_int_value {
    ($($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )+
    };
}

impl_small_int_value!(i8, i16, i32, u8, u16);

impl ToSqlValue for isize {
    fn to_sql_value(self) -> SqlValue {
        // isize is at most 64 bits on every supported target
        SqlValue::Int(self as i64)
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u64 {
    fn to_sql_value(self) -> SqlValue {
        i64::try_from(self).map_or_else(|_| SqlValue::Text(self.to_string()), SqlValue::Int)
    }
}

impl ToSqlValue for usize {
    fn to_sql_value(self) -> SqlValue {
        (self as u64).to_sql_value()
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for &String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl ToSqlValue for DateTime<Utc> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self)
    }
}

impl ToSqlValue for serde_json::Value {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Json(self)
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

macro_rules! impl_array_value {
    ($($ty:ty),+) => {
        $(
            impl ToSqlValue for Vec<$ty> {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::array(self)
                }
            }
        )+
    };
}

impl_array_value!(String, i32, i64, f64, bool);

impl<const N: usize> ToSqlValue for [u8; N] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

macro_rules! impl_fixed_array_value {
    ($($ty:ty),+) => {
        $(
            impl<const N: usize> ToSqlValue for [$ty; N] {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::array(self)
                }
            }
        )+
    };
}

impl_fixed_array_value!(String, i32, i64, f64, bool);

fn json_object<I, V>(entries: I) -> SqlValue
where
    I: IntoIterator<Item = (String, V)>,
    V: ToSqlValue,
{
    SqlValue::Json(serde_json::Value::Object(
        entries
            .into_iter()
            .map(|(k, v)| (k, v.to_sql_value().into_json()))
            .collect(),
    ))
}

impl<V: ToSqlValue, S> ToSqlValue for HashMap<String, V, S> {
    fn to_sql_value(self) -> SqlValue {
        json_object(self)
    }
}

impl<V: ToSqlValue> ToSqlValue for BTreeMap<String, V> {
    fn to_sql_value(self) -> SqlValue {
        json_object(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values() {
        assert!(SqlValue::Null.is_zero());
        assert!(SqlValue::Int(0).is_zero());
        assert!(SqlValue::Text(String::new()).is_zero());
        assert!(SqlValue::Array(vec![]).is_zero());
        assert!(SqlValue::Json(serde_json::json!({})).is_zero());
        assert!(!SqlValue::Int(30).is_zero());
        assert!(!SqlValue::Bool(true).is_zero());
        assert!(SqlValue::Timestamp(DateTime::<Utc>::UNIX_EPOCH).is_zero());
        assert!(!SqlValue::Timestamp(DateTime::<Utc>::MIN_UTC).is_zero());
    }

    #[test]
    fn test_sql_value_inline_text_escaping() {
        assert_eq!(
            SqlValue::Text(String::from("O'Brien")).to_sql_inline(),
            "'O''Brien'"
        );
    }

    #[test]
    fn test_sql_value_inline_array() {
        let value = vec![1_i64, 2, 3].to_sql_value();
        assert_eq!(value.to_sql_inline(), "ARRAY[1, 2, 3]");
    }

    #[test]
    fn test_map_becomes_json_document() {
        let mut scores = BTreeMap::new();
        scores.insert(String::from("math"), 12_i64);
        assert_eq!(
            scores.to_sql_value(),
            SqlValue::Json(serde_json::json!({"math": 12}))
        );
    }

    #[test]
    fn test_into_json() {
        let value = SqlValue::Array(vec![SqlValue::Int(1), SqlValue::Null, SqlValue::Float(f64::NAN)]);
        assert_eq!(value.into_json(), serde_json::json!([1, null, null]));
    }

    #[test]
    fn test_to_sql_value_conversions() {
        assert_eq!(true.to_sql_value(), SqlValue::Bool(true));
        assert_eq!(42_i32.to_sql_value(), SqlValue::Int(42));
        assert_eq!("hello".to_sql_value(), SqlValue::Text(String::from("hello")));
        assert_eq!(None::<i32>.to_sql_value(), SqlValue::Null);
        assert_eq!(u64::MAX.to_sql_value(), SqlValue::Text(u64::MAX.to_string()));
        assert_eq!(7_u8.to_sql_value(), SqlValue::Int(7));
        assert_eq!((-3_i16).to_sql_value(), SqlValue::Int(-3));
        assert_eq!([1_u8, 2].to_sql_value(), SqlValue::Blob(vec![1, 2]));
        assert_eq!(
            [1_i64, 2].to_sql_value(),
            SqlValue::Array(vec![SqlValue::Int(1), SqlValue::Int(2)])
        );
        assert_eq!(
            vec![String::from("a")].to_sql_value(),
            SqlValue::Array(vec![SqlValue::Text(String::from("a"))])
        );
    }
}
