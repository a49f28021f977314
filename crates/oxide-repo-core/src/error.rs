//! Error types for schema construction and statement compilation.

use thiserror::Error;

/// Errors raised while building a schema or compiling a statement.
#[derive(Debug, Error)]
pub enum Error {
    /// The record description does not form a valid schema.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A field type could not be classified.
    #[error("type resolution error: {0}")]
    TypeResolution(#[from] TypeResolutionError),

    /// The chosen dialect cannot express something the schema or call needs.
    #[error("dialect capability error: {0}")]
    DialectCapability(#[from] DialectCapabilityError),

    /// A row of an insert-many batch does not share the first row's columns.
    #[error("row {row} of batch has columns {found:?}, expected {expected:?}")]
    ColumnSetMismatch {
        /// Index of the offending row.
        row: usize,
        /// Columns of the first row.
        expected: Vec<String>,
        /// Columns of the offending row.
        found: Vec<String>,
    },

    /// An update has no column left to set.
    #[error("update of '{collection}' has no column to set")]
    EmptyUpdate {
        /// Collection being updated.
        collection: String,
    },

    /// An insert-many batch of several rows has no column to write.
    #[error("batch insert into '{collection}' has no column to write")]
    EmptyBatchColumns {
        /// Collection being written.
        collection: String,
    },

    /// An aggregate statement has no output column.
    #[error("aggregate over '{collection}' has no output column")]
    EmptyAggregate {
        /// Collection being aggregated.
        collection: String,
    },

    /// A clause was given to an operation that cannot use it.
    #[error("{clause} clause is not allowed in {operation}")]
    UnexpectedClause {
        /// Operation being compiled.
        operation: &'static str,
        /// Kind of the rejected clause.
        clause: &'static str,
    },

    /// A JSON record document could not be read.
    #[error("invalid record descriptor: {0}")]
    Descriptor(#[from] serde_json::Error),
}

/// Errors in the shape of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No column is marked as the identity column.
    #[error("no ident column in '{collection}'")]
    NoIdentColumn {
        /// Collection name.
        collection: String,
    },

    /// More than one column is marked as the identity column.
    #[error("multiple ident columns in '{collection}': {columns:?}")]
    MultipleIdentColumns {
        /// Collection name.
        collection: String,
        /// Every column marked as ident.
        columns: Vec<String>,
    },

    /// Two columns share a storage name.
    #[error("duplicate column '{column}' in '{collection}'")]
    DuplicateColumn {
        /// Collection name.
        collection: String,
        /// Repeated storage name.
        column: String,
    },

    /// A statement references a column the schema does not have.
    #[error("unknown column '{column}' in '{collection}'")]
    UnknownColumn {
        /// Collection name.
        collection: String,
        /// Referenced name.
        column: String,
    },

    /// A write targets a system-generated column.
    #[error("column '{column}' of '{collection}' is auto-generated and cannot be written")]
    AutoColumnWrite {
        /// Collection name.
        collection: String,
        /// Auto column name.
        column: String,
    },

    /// A column-to-column comparison uses a column not marked comparable.
    #[error("column '{column}' of '{collection}' is not comparable to other columns")]
    NotComparable {
        /// Collection name.
        collection: String,
        /// Column name.
        column: String,
    },
}

/// Errors raised while classifying a field type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeResolutionError {
    /// The raw kind is outside the supported set.
    #[error("unsupported field type '{raw}'")]
    Unsupported {
        /// Raw kind as given.
        raw: String,
    },

    /// A named type has no name to carry forward.
    #[error("named type in '{path}' has an empty name")]
    MissingName {
        /// Module path of the type.
        path: String,
    },
}

/// Errors raised when a dialect lacks a capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialectCapabilityError {
    /// A container column cannot be stored by the dialect.
    #[error("{dialect} has no native support for container column '{column}'")]
    UnsupportedContainer {
        /// Dialect name.
        dialect: &'static str,
        /// Column name.
        column: String,
    },

    /// An array argument cannot be bound.
    #[error("{dialect} cannot bind array argument: {reason}")]
    UnsupportedArray {
        /// Dialect name.
        dialect: &'static str,
        /// Why binding failed.
        reason: String,
    },

    /// A transaction handle is not of the type the dialect expects.
    #[error("expecting tx to be a {expected} transaction, got {found}")]
    TxMismatch {
        /// Backend the repository runs on.
        expected: &'static str,
        /// Backend that opened the handle.
        found: &'static str,
    },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
