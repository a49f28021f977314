//! Record descriptions and the schema model.
//!
//! A [`RecordDescriptor`] is the declarative input: a collection name and a
//! list of column declarations. [`build_schema`] resolves every column type and
//! checks the single-identity invariant, producing an immutable [`Schema`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, SchemaError};
use crate::types::{Shaped, TypeDescriptor, TypeShape};

/// Declaration of one column of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Storage name.
    pub name: String,
    /// Accessor name; defaults to the storage name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Raw type of the field.
    #[serde(rename = "type")]
    pub shape: TypeShape,
    /// Marks the identity column.
    #[serde(default)]
    pub ident: bool,
    /// Marks a system-generated column.
    #[serde(default)]
    pub auto: bool,
    /// Forces the column to be nullable.
    #[serde(default)]
    pub nullable: bool,
    /// Allows comparing this column to other columns.
    #[serde(default)]
    pub comparable: bool,
}

impl ColumnDescriptor {
    /// Declares a column with an explicit shape.
    #[must_use]
    pub fn new(name: &str, shape: TypeShape) -> Self {
        Self {
            name: String::from(name),
            field: None,
            shape,
            ident: false,
            auto: false,
            nullable: false,
            comparable: false,
        }
    }

    /// Declares a column holding values of type `T`.
    #[must_use]
    pub fn of<T: Shaped>(name: &str) -> Self {
        Self::new(name, T::shape())
    }

    /// Overrides the accessor name.
    #[must_use]
    pub fn field(mut self, field: &str) -> Self {
        self.field = Some(String::from(field));
        self
    }

    /// Marks the column as the identity column.
    #[must_use]
    pub const fn ident(mut self) -> Self {
        self.ident = true;
        self
    }

    /// Marks the column as system-generated.
    #[must_use]
    pub const fn auto(mut self) -> Self {
        self.auto = true;
        self
    }

    /// Marks the column as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Allows column-to-column comparisons on this column.
    #[must_use]
    pub const fn comparable(mut self) -> Self {
        self.comparable = true;
        self
    }
}

/// Declarative description of a record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDescriptor {
    /// Package the generated repository belongs to.
    #[serde(default)]
    pub package: String,
    /// Collection (table) name.
    pub collection: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDescriptor>,
}

impl RecordDescriptor {
    /// Starts a descriptor with no columns.
    #[must_use]
    pub fn new(package: &str, collection: &str) -> Self {
        Self {
            package: String::from(package),
            collection: String::from(collection),
            columns: vec![],
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Reads a descriptor from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A resolved column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Storage name.
    pub name: String,
    /// Accessor name.
    pub field_name: String,
    /// Resolved type.
    pub ty: TypeDescriptor,
    /// Whether this is the identity column.
    pub is_ident: bool,
    /// Whether the column is system-generated and excluded from writes.
    pub is_auto: bool,
    /// Whether the column can hold NULL.
    pub is_nullable: bool,
    /// Whether the column can be compared to other columns.
    pub is_comparable: bool,
}

impl Column {
    fn resolve(descriptor: &ColumnDescriptor) -> Result<Self> {
        let ty = TypeDescriptor::resolve(&descriptor.shape)?;
        Ok(Self {
            name: descriptor.name.clone(),
            field_name: descriptor
                .field
                .clone()
                .unwrap_or_else(|| descriptor.name.clone()),
            is_ident: descriptor.ident,
            is_auto: descriptor.auto,
            is_nullable: descriptor.nullable || ty.nullable,
            is_comparable: descriptor.comparable,
            ty,
        })
    }

    /// Returns whether the column takes part in writes.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        !self.is_auto
    }
}

/// Immutable column model of one record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    package: String,
    collection: String,
    columns: Vec<Column>,
    #[serde(skip)]
    ident: usize,
}

impl Schema {
    /// Returns the package name.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Returns the collection name.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the identity column.
    #[must_use]
    pub fn ident(&self) -> &Column {
        &self.columns[self.ident]
    }

    /// Looks up a column by storage name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a column, failing when it does not exist.
    pub fn require(&self, name: &str) -> std::result::Result<&Column, SchemaError> {
        self.column(name).ok_or_else(|| SchemaError::UnknownColumn {
            collection: self.collection.clone(),
            column: String::from(name),
        })
    }

    /// Returns the columns that take part in writes.
    pub fn write_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_writable())
    }
}

/// Builds the schema of a record.
///
/// Fails when a column type cannot be resolved, when two columns share a
/// storage name, or when the record does not have exactly one identity
/// column.
pub fn build_schema(record: &RecordDescriptor) -> Result<Schema> {
    let mut columns = Vec::with_capacity(record.columns.len());
    let mut seen = HashSet::new();
    let mut idents = vec![];

    for descriptor in &record.columns {
        if !seen.insert(descriptor.name.as_str()) {
            return Err(SchemaError::DuplicateColumn {
                collection: record.collection.clone(),
                column: descriptor.name.clone(),
            }
            .into());
        }
        let column = Column::resolve(descriptor)?;
        if column.is_ident {
            idents.push(columns.len());
        }
        columns.push(column);
    }

    let ident = match idents.as_slice() {
        [] => {
            return Err(SchemaError::NoIdentColumn {
                collection: record.collection.clone(),
            }
            .into())
        }
        [index] => *index,
        _ => {
            return Err(SchemaError::MultipleIdentColumns {
                collection: record.collection.clone(),
                columns: idents.iter().map(|i| columns[*i].name.clone()).collect(),
            }
            .into())
        }
    };

    trace!(
        collection = %record.collection,
        columns = columns.len(),
        ident = %columns[ident].name,
        "Built schema"
    );

    Ok(Schema {
        package: record.package.clone(),
        collection: record.collection.clone(),
        columns,
        ident,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::Kind;

    fn users() -> RecordDescriptor {
        RecordDescriptor::new("user", "users")
            .column(ColumnDescriptor::of::<i64>("id").ident().auto())
            .column(ColumnDescriptor::of::<String>("email").comparable())
            .column(ColumnDescriptor::of::<Option<String>>("name").field("display_name"))
    }

    #[test]
    fn test_build_schema() {
        let schema = build_schema(&users()).unwrap();
        assert_eq!(schema.collection(), "users");
        assert_eq!(schema.package(), "user");
        assert_eq!(schema.ident().name, "id");
        assert_eq!(schema.columns().len(), 3);

        let name = schema.column("name").unwrap();
        assert_eq!(name.field_name, "display_name");
        assert!(name.is_nullable);
        assert_eq!(name.ty.kind, Kind::String);

        let email = schema.column("email").unwrap();
        assert_eq!(email.field_name, "email");
        assert!(email.is_comparable);

        let writable: Vec<&str> = schema.write_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(writable, vec!["email", "name"]);
    }

    #[test]
    fn test_no_ident_column() {
        let record = RecordDescriptor::new("user", "users")
            .column(ColumnDescriptor::of::<String>("email"));
        let err = build_schema(&record).unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::NoIdentColumn { .. })
        ));
    }

    #[test]
    fn test_multiple_ident_columns() {
        let record = users().column(ColumnDescriptor::of::<String>("uuid").ident());
        let err = build_schema(&record).unwrap_err();
        match err {
            Error::Schema(SchemaError::MultipleIdentColumns { columns, .. }) => {
                assert_eq!(columns, vec!["id", "uuid"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_column() {
        let record = users().column(ColumnDescriptor::of::<i32>("email"));
        let err = build_schema(&record).unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::DuplicateColumn { ref column, .. }) if column == "email"
        ));
    }

    #[test]
    fn test_explicit_nullable_hook() {
        let record = users().column(ColumnDescriptor::of::<String>("nickname").nullable());
        let schema = build_schema(&record).unwrap();
        let nickname = schema.column("nickname").unwrap();
        assert!(nickname.is_nullable);
        assert!(!nickname.ty.nullable);
    }

    #[test]
    fn test_unknown_column_lookup() {
        let schema = build_schema(&users()).unwrap();
        let err = schema.require("age").unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownColumn {
                collection: String::from("users"),
                column: String::from("age"),
            }
        );
    }

    #[test]
    fn test_from_json() {
        let record = RecordDescriptor::from_json(
            r#"{
                "package": "user",
                "collection": "users",
                "columns": [
                    {"name": "id", "type": {"kind": "int64"}, "ident": true, "auto": true},
                    {"name": "tags", "type": {"kind": "list", "element": {"kind": "string"}}}
                ]
            }"#,
        )
        .unwrap();
        let schema = build_schema(&record).unwrap();
        assert_eq!(schema.ident().name, "id");
        assert_eq!(schema.column("tags").unwrap().ty.kind, Kind::Slice);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = RecordDescriptor::from_json("{\"collection\": 1}").unwrap_err();
        assert!(matches!(err, Error::Descriptor(_)));
    }

    #[test]
    fn test_type_error_surfaces() {
        let record = users().column(ColumnDescriptor::new(
            "callback",
            TypeShape::Other {
                raw: String::from("func"),
            },
        ));
        assert!(matches!(
            build_schema(&record).unwrap_err(),
            Error::TypeResolution(_)
        ));
    }
}
