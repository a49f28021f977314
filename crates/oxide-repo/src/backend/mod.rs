//! Execution boundary.
//!
//! A [`Backend`] opens transactions and runs compiled statement plans inside
//! them. Callers only ever see the opaque [`Tx`] handle; a handle opened by
//! one backend is rejected by every other one before any statement runs.

mod postgres;
mod sqlite;

use std::any::Any;
use std::fmt;

use oxide_repo_core::{Dialect, DialectCapabilityError, StatementPlan};

use crate::error::Result;
use crate::row::Row;

pub use postgres::PostgresBackend;
pub use sqlite::SqliteBackend;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Number of rows written or removed.
    pub rows_affected: u64,
    /// Identity of the last inserted row, when the database reports one.
    pub last_insert_id: Option<i64>,
}

/// A database able to run statement plans in transactions.
#[allow(async_fn_in_trait)]
pub trait Backend: Send + Sync {
    /// Backend name, matching the dialect name.
    const NAME: &'static str;

    /// Native transaction type.
    type Tx: Send + 'static;

    /// Returns the dialect statements are compiled for.
    fn dialect(&self) -> Dialect;

    /// Opens a transaction.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Commits a transaction.
    async fn commit(&self, tx: Self::Tx) -> Result<()>;

    /// Rolls a transaction back.
    async fn rollback(&self, tx: Self::Tx) -> Result<()>;

    /// Runs a statement and decodes every returned row.
    async fn query(&self, tx: &mut Self::Tx, plan: &StatementPlan) -> Result<Vec<Row>>;

    /// Runs a statement that returns no rows.
    async fn exec(&self, tx: &mut Self::Tx, plan: &StatementPlan) -> Result<ExecResult>;
}

/// Transaction handle shared between repositories of the same backend.
pub struct Tx {
    backend: &'static str,
    inner: Box<dyn Any + Send>,
}

impl Tx {
    pub(crate) fn new<B: Backend>(inner: B::Tx) -> Self {
        Self {
            backend: B::NAME,
            inner: Box::new(inner),
        }
    }

    /// Returns the name of the backend that opened the transaction.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        self.backend
    }

    pub(crate) fn native_mut<B: Backend>(&mut self) -> Result<&mut B::Tx> {
        let found = self.backend;
        self.inner
            .downcast_mut::<B::Tx>()
            .ok_or_else(|| mismatch::<B>(found).into())
    }

    pub(crate) fn into_native<B: Backend>(self) -> Result<B::Tx> {
        let found = self.backend;
        self.inner
            .downcast::<B::Tx>()
            .map(|inner| *inner)
            .map_err(|_| mismatch::<B>(found).into())
    }
}

const fn mismatch<B: Backend>(found: &'static str) -> DialectCapabilityError {
    DialectCapabilityError::TxMismatch {
        expected: B::NAME,
        found,
    }
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tx")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}
