//! Record and aggregate destination traits.

use oxide_repo_core::builder::Create;
use oxide_repo_core::{RecordDescriptor, SqlValue, ToSqlValue};

use crate::error::Result;
use crate::row::{FromValue, Row};

/// A type stored as one row of a collection.
///
/// Usually implemented with `#[derive(Record)]` from `oxide-repo-derive`.
///
/// # Example
///
/// ```ignore
/// use oxide_repo::Record;
///
/// #[derive(Record)]
/// #[record(collection = "users")]
/// struct User {
///     #[column(ident, auto)]
///     id: i64,
///     email: String,
///     #[column(name = "display_name")]
///     name: Option<String>,
/// }
/// ```
pub trait Record: Sized + Send + Sync + 'static {
    /// Type of the identity column.
    type Id: FromValue + ToSqlValue + Send;

    /// Describes the columns of the record.
    fn descriptor() -> RecordDescriptor;

    /// Decodes a record from a result row.
    fn from_row(row: &Row) -> Result<Self>;

    /// Returns the values of every writable column, in declaration order.
    fn values(&self) -> Vec<(&'static str, SqlValue)>;

    /// Returns the insert request for this record.
    fn to_create(&self) -> Create {
        Create::from_values(self.values())
    }
}

/// Destination of one aggregate result row.
///
/// `FIELDS` must equal the number of aggregate columns of the statement; the
/// repository checks it before decoding.
pub trait AggregateRow: Sized {
    /// Number of fields read from each row.
    const FIELDS: usize;

    /// Decodes one result row.
    fn from_row(row: &Row) -> Result<Self>;
}

macro_rules! impl_aggregate_row_tuple {
    ($len:literal => $($name:ident : $index:tt),+) => {
        impl<$($name: FromValue),+> AggregateRow for ($($name,)+) {
            const FIELDS: usize = $len;

            fn from_row(row: &Row) -> Result<Self> {
                Ok(($(row.get_at::<$name>($index)?,)+))
            }
        }
    };
}

impl_aggregate_row_tuple!(1 => A: 0);
impl_aggregate_row_tuple!(2 => A: 0, B: 1);
impl_aggregate_row_tuple!(3 => A: 0, B: 1, C: 2);
impl_aggregate_row_tuple!(4 => A: 0, B: 1, C: 2, D: 3);
