//! SQL dialect descriptors.
//!
//! The two supported dialects differ only in a handful of capabilities:
//! placeholder syntax, identifier quoting, how the identity of an inserted
//! row is retrieved, and whether container values can be bound natively.
//! A [`Dialect`] records those capabilities; the compiler is shared.

mod postgres;
mod sqlite;

use serde::Serialize;

use crate::builder::value::SqlValue;
use crate::error::DialectCapabilityError;
use crate::schema::{Column, Schema};

/// Parameter placeholder style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Placeholder {
    /// `?` for every argument.
    Positional,
    /// `$1`, `$2`, ... numbered from one.
    Numbered,
}

/// How the identity of an inserted row is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IdentityStrategy {
    /// The insert carries `RETURNING <ident>` and the row is read back.
    Returning,
    /// A separate last-insert-id lookup after the insert.
    LastInsertId,
}

/// Capability descriptor of a SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dialect {
    name: &'static str,
    placeholder: Placeholder,
    quote: Option<char>,
    insert_returns_identity: bool,
    native_containers: bool,
    offset_needs_limit: bool,
}

impl Dialect {
    /// Returns the dialect name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the placeholder style.
    #[must_use]
    pub const fn placeholder_style(&self) -> Placeholder {
        self.placeholder
    }

    /// Returns the placeholder for the argument at 1-based `position`.
    #[must_use]
    pub fn placeholder(&self, position: usize) -> String {
        match self.placeholder {
            Placeholder::Positional => String::from("?"),
            Placeholder::Numbered => format!("${position}"),
        }
    }

    /// Quotes an identifier, or returns it unchanged when the dialect does
    /// not quote.
    #[must_use]
    pub fn quote_identifier(&self, name: &str) -> String {
        match self.quote {
            Some(quote) => {
                let escaped = name.replace(quote, &format!("{quote}{quote}"));
                format!("{quote}{escaped}{quote}")
            }
            None => String::from(name),
        }
    }

    /// Returns whether inserts append a RETURNING clause.
    #[must_use]
    pub const fn insert_returns_identity(&self) -> bool {
        self.insert_returns_identity
    }

    /// Returns how inserted identities are retrieved.
    #[must_use]
    pub const fn identity_strategy(&self) -> IdentityStrategy {
        if self.insert_returns_identity {
            IdentityStrategy::Returning
        } else {
            IdentityStrategy::LastInsertId
        }
    }

    /// Returns whether arrays and maps can be bound natively.
    #[must_use]
    pub const fn supports_containers(&self) -> bool {
        self.native_containers
    }

    /// Returns whether OFFSET is only valid after a LIMIT.
    #[must_use]
    pub const fn offset_needs_limit(&self) -> bool {
        self.offset_needs_limit
    }

    /// Checks that every column of a schema can be stored by this dialect.
    pub fn check_schema(&self, schema: &Schema) -> Result<(), DialectCapabilityError> {
        schema
            .columns()
            .iter()
            .try_for_each(|column| self.check_column(column))
    }

    /// Checks that a column can be stored by this dialect.
    ///
    /// Container columns that are not value-codec types need native
    /// array support.
    pub fn check_column(&self, column: &Column) -> Result<(), DialectCapabilityError> {
        if column.ty.needs_container_support() && !self.native_containers {
            return Err(DialectCapabilityError::UnsupportedContainer {
                dialect: self.name,
                column: column.name.clone(),
            });
        }
        Ok(())
    }

    /// Prepares a value bound against `column`.
    ///
    /// Map columns go through the JSON adapter and list columns through the
    /// array adapter. Arrays must be flat and homogeneous; dialects without
    /// native containers reject them outright.
    pub fn adapt(&self, column: &Column, value: SqlValue) -> Result<SqlValue, DialectCapabilityError> {
        let value = if column.ty.needs_json_adapter() && self.native_containers {
            match value {
                SqlValue::Null | SqlValue::Json(_) => value,
                other => SqlValue::Json(other.into_json()),
            }
        } else {
            value
        };

        if let SqlValue::Array(items) = &value {
            if !self.native_containers {
                return Err(DialectCapabilityError::UnsupportedArray {
                    dialect: self.name,
                    reason: format!("column '{}' receives a list value", column.name),
                });
            }
            check_array(self.name, items)?;
        }
        Ok(value)
    }

    /// Returns SQL text written in place of a placeholder for `value`.
    ///
    /// An array with no non-null element has no element type to bind with.
    /// Native array dialects write it as an untyped literal typed by the
    /// server from the target column.
    #[must_use]
    pub fn untyped_literal(&self, value: &SqlValue) -> Option<String> {
        match value {
            SqlValue::Array(items)
                if self.native_containers && items.iter().all(SqlValue::is_null) =>
            {
                Some(format!("'{{{}}}'", vec!["NULL"; items.len()].join(",")))
            }
            _ => None,
        }
    }

    /// Converts a last-insert-id into the identity column's type.
    ///
    /// String identities receive the decimal form of the id.
    #[must_use]
    pub fn identity_from_last_insert_id(&self, column: &Column, id: i64) -> SqlValue {
        if column.ty.is_string() {
            SqlValue::Text(id.to_string())
        } else {
            SqlValue::Int(id)
        }
    }
}

fn check_array(dialect: &'static str, items: &[SqlValue]) -> Result<(), DialectCapabilityError> {
    let mut element: Option<std::mem::Discriminant<SqlValue>> = None;
    for item in items {
        match item {
            SqlValue::Null => continue,
            SqlValue::Array(_) => {
                return Err(DialectCapabilityError::UnsupportedArray {
                    dialect,
                    reason: String::from("nested arrays are not supported"),
                })
            }
            _ => {}
        }
        let kind = std::mem::discriminant(item);
        match element {
            Some(seen) if seen != kind => {
                return Err(DialectCapabilityError::UnsupportedArray {
                    dialect,
                    reason: String::from("array elements have mixed types"),
                })
            }
            _ => element = Some(kind),
        }
    }
    Ok(())
}
