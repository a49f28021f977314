//! Typed repositories.
//!
//! A [`Repository`] compiles every request against the schema of its record
//! type and runs the resulting plan on its backend. Each operation comes in
//! two forms: `op` opens and finishes its own transaction, `op_tx` runs inside
//! a transaction obtained from [`Repository::tx`].

use std::marker::PhantomData;

use oxide_repo_core::builder::{Aggregation, Delete, Query, Update};
use oxide_repo_core::{
    build_schema, CompileOptions, Compiler, IdentityStrategy, Schema, StatementPlan,
};
use tracing::{debug, warn};

use crate::backend::{Backend, ExecResult, Tx};
use crate::error::{RepoError, Result};
use crate::record::{AggregateRow, Record};
use crate::row::decode;

/// Data access for one record type on one backend.
///
/// # Example
///
/// ```ignore
/// use oxide_repo::{Predicate, Query, Repository, SqliteBackend};
///
/// let users = Repository::<User, _>::new(SqliteBackend::new(pool))?;
///
/// let id = users.create(&user).await?;
/// let adults = users
///     .query(&Query::new().filter(Predicate::gt_or_eq("age", 18)))
///     .await?;
///
/// let mut tx = users.tx().await?;
/// users.delete_tx(&mut tx, &Delete::new().filter(Predicate::eq("id", id))).await?;
/// users.commit(tx).await?;
/// ```
#[derive(Debug)]
pub struct Repository<R: Record, B: Backend> {
    backend: B,
    schema: Schema,
    options: CompileOptions,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record, B: Backend> Repository<R, B> {
    /// Creates a repository, building and checking the record schema.
    ///
    /// Fails when the schema is invalid or uses a column type the backend's
    /// dialect cannot store.
    pub fn new(backend: B) -> Result<Self> {
        let schema = build_schema(&R::descriptor())?;
        Compiler::new(&schema, backend.dialect()).validate_schema()?;
        Ok(Self {
            backend,
            schema,
            options: CompileOptions::default(),
            _record: PhantomData,
        })
    }

    /// Sets the compile options used for every statement.
    #[must_use]
    pub const fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the record schema.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns a compiler for the record schema and backend dialect.
    #[must_use]
    pub fn compiler(&self) -> Compiler<'_> {
        Compiler::new(&self.schema, self.backend.dialect()).with_options(self.options)
    }

    /// Opens a transaction.
    pub async fn tx(&self) -> Result<Tx> {
        Ok(Tx::new::<B>(self.backend.begin().await?))
    }

    /// Commits a transaction opened by [`Repository::tx`].
    pub async fn commit(&self, tx: Tx) -> Result<()> {
        self.backend.commit(tx.into_native::<B>()?).await
    }

    /// Rolls back a transaction opened by [`Repository::tx`].
    pub async fn rollback(&self, tx: Tx) -> Result<()> {
        self.backend.rollback(tx.into_native::<B>()?).await
    }

    /// Inserts a record and returns its identity.
    pub async fn create(&self, record: &R) -> Result<R::Id> {
        let plan = self.compiler().insert_one(&record.to_create())?;
        let mut tx = self.backend.begin().await?;
        let result = self.run_create(&mut tx, "Create", &plan).await;
        self.finish(tx, result).await
    }

    /// Inserts a record inside `tx` and returns its identity.
    pub async fn create_tx(&self, tx: &mut Tx, record: &R) -> Result<R::Id> {
        let tx = tx.native_mut::<B>()?;
        let plan = self.compiler().insert_one(&record.to_create())?;
        self.run_create(tx, "CreateTx", &plan).await
    }

    /// Inserts a batch of records with one statement.
    ///
    /// An empty batch does nothing and opens no transaction.
    pub async fn create_many(&self, records: &[R]) -> Result<()> {
        let Some(plan) = self.compile_many(records)? else {
            return Ok(());
        };
        let mut tx = self.backend.begin().await?;
        let result = self.run_exec(&mut tx, "CreateMany", &plan).await;
        self.finish(tx, result).await.map(|_| ())
    }

    /// Inserts a batch of records inside `tx`.
    pub async fn create_many_tx(&self, tx: &mut Tx, records: &[R]) -> Result<()> {
        let tx = tx.native_mut::<B>()?;
        let Some(plan) = self.compile_many(records)? else {
            return Ok(());
        };
        self.run_exec(tx, "CreateManyTx", &plan).await.map(|_| ())
    }

    /// Returns the records matching `query`.
    pub async fn query(&self, query: &Query) -> Result<Vec<R>> {
        let plan = self.compiler().select(query)?;
        let mut tx = self.backend.begin().await?;
        let result = self.run_query(&mut tx, "Query", &plan).await;
        self.finish(tx, result).await
    }

    /// Returns the records matching `query` inside `tx`.
    pub async fn query_tx(&self, tx: &mut Tx, query: &Query) -> Result<Vec<R>> {
        let tx = tx.native_mut::<B>()?;
        let plan = self.compiler().select(query)?;
        self.run_query(tx, "QueryTx", &plan).await
    }

    /// Returns the first record matching `query`.
    ///
    /// Fails with [`RepoError::NotFound`] when nothing matches.
    pub async fn query_one(&self, query: &Query) -> Result<R> {
        let plan = self.compiler().select_one(query)?;
        let mut tx = self.backend.begin().await?;
        let result = self.run_query_one(&mut tx, "QueryOne", &plan).await;
        self.finish(tx, result).await
    }

    /// Returns the first record matching `query` inside `tx`.
    pub async fn query_one_tx(&self, tx: &mut Tx, query: &Query) -> Result<R> {
        let tx = tx.native_mut::<B>()?;
        let plan = self.compiler().select_one(query)?;
        self.run_query_one(tx, "QueryOneTx", &plan).await
    }

    /// Updates the matching rows and returns how many changed.
    pub async fn update(&self, update: &Update) -> Result<u64> {
        let plan = self.compiler().update(update)?;
        let mut tx = self.backend.begin().await?;
        let result = self.run_exec(&mut tx, "Update", &plan).await;
        self.finish(tx, result).await
    }

    /// Updates the matching rows inside `tx`.
    pub async fn update_tx(&self, tx: &mut Tx, update: &Update) -> Result<u64> {
        let tx = tx.native_mut::<B>()?;
        let plan = self.compiler().update(update)?;
        self.run_exec(tx, "UpdateTx", &plan).await
    }

    /// Deletes the matching rows and returns how many were removed.
    pub async fn delete(&self, delete: &Delete) -> Result<u64> {
        let plan = self.compiler().delete(delete)?;
        let mut tx = self.backend.begin().await?;
        let result = self.run_exec(&mut tx, "Delete", &plan).await;
        self.finish(tx, result).await
    }

    /// Deletes the matching rows inside `tx`.
    pub async fn delete_tx(&self, tx: &mut Tx, delete: &Delete) -> Result<u64> {
        let tx = tx.native_mut::<B>()?;
        let plan = self.compiler().delete(delete)?;
        self.run_exec(tx, "DeleteTx", &plan).await
    }

    /// Runs an aggregate select and decodes one `D` per result row.
    ///
    /// `D::FIELDS` must match the number of aggregate columns.
    pub async fn aggregate<D: AggregateRow>(&self, aggregation: &Aggregation) -> Result<Vec<D>> {
        let plan = self.compiler().aggregate(aggregation)?;
        let mut tx = self.backend.begin().await?;
        let result = self
            .run_aggregate(&mut tx, "Aggregate", aggregation, &plan)
            .await;
        self.finish(tx, result).await
    }

    /// Runs an aggregate select inside `tx`.
    pub async fn aggregate_tx<D: AggregateRow>(
        &self,
        tx: &mut Tx,
        aggregation: &Aggregation,
    ) -> Result<Vec<D>> {
        let tx = tx.native_mut::<B>()?;
        let plan = self.compiler().aggregate(aggregation)?;
        self.run_aggregate(tx, "AggregateTx", aggregation, &plan).await
    }

    fn compile_many(&self, records: &[R]) -> Result<Option<StatementPlan>> {
        let rows: Vec<_> = records.iter().map(Record::to_create).collect();
        self.compiler().insert_many(&rows).map_err(Into::into)
    }

    async fn run_create(
        &self,
        tx: &mut B::Tx,
        op: &'static str,
        plan: &StatementPlan,
    ) -> Result<R::Id> {
        let dialect = self.backend.dialect();
        match dialect.identity_strategy() {
            IdentityStrategy::Returning => {
                log_statement(op, plan);
                let row = self
                    .backend
                    .query(tx, plan)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or(RepoError::NotFound)?;
                row.get_at(0)
            }
            IdentityStrategy::LastInsertId => {
                let done = self.run_exec_raw(tx, op, plan).await?;
                let ident = self.schema.ident();
                let id = done.last_insert_id.ok_or_else(|| RepoError::Decode {
                    column: ident.name.clone(),
                    message: String::from("backend reported no last insert id"),
                })?;
                decode(&ident.name, dialect.identity_from_last_insert_id(ident, id))
            }
        }
    }

    async fn run_query(
        &self,
        tx: &mut B::Tx,
        op: &'static str,
        plan: &StatementPlan,
    ) -> Result<Vec<R>> {
        log_statement(op, plan);
        self.backend
            .query(tx, plan)
            .await?
            .iter()
            .map(R::from_row)
            .collect()
    }

    async fn run_query_one(
        &self,
        tx: &mut B::Tx,
        op: &'static str,
        plan: &StatementPlan,
    ) -> Result<R> {
        log_statement(op, plan);
        let rows = self.backend.query(tx, plan).await?;
        rows.first().map_or(Err(RepoError::NotFound), R::from_row)
    }

    async fn run_exec(
        &self,
        tx: &mut B::Tx,
        op: &'static str,
        plan: &StatementPlan,
    ) -> Result<u64> {
        Ok(self.run_exec_raw(tx, op, plan).await?.rows_affected)
    }

    async fn run_exec_raw(
        &self,
        tx: &mut B::Tx,
        op: &'static str,
        plan: &StatementPlan,
    ) -> Result<ExecResult> {
        log_statement(op, plan);
        self.backend.exec(tx, plan).await
    }

    async fn run_aggregate<D: AggregateRow>(
        &self,
        tx: &mut B::Tx,
        op: &'static str,
        aggregation: &Aggregation,
        plan: &StatementPlan,
    ) -> Result<Vec<D>> {
        log_statement(op, plan);
        let rows = self.backend.query(tx, plan).await?;
        let expected = aggregation.width();
        if expected != D::FIELDS {
            return Err(RepoError::ArityMismatch {
                expected,
                found: D::FIELDS,
            });
        }
        rows.iter().map(D::from_row).collect()
    }

    /// Commits on success; rolls back on failure, keeping both errors when
    /// the rollback fails too.
    async fn finish<T>(&self, tx: B::Tx, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.backend
                    .commit(tx)
                    .await
                    .map_err(|e| RepoError::Commit {
                        source: Box::new(e),
                    })?;
                Ok(value)
            }
            Err(err) => match self.backend.rollback(tx).await {
                Ok(()) => Err(err),
                Err(rollback) => {
                    warn!(error = %err, rollback = %rollback, "Rollback failed");
                    Err(RepoError::Rollback {
                        source: Box::new(err),
                        rollback: Box::new(rollback),
                    })
                }
            },
        }
    }
}

fn log_statement(op: &'static str, plan: &StatementPlan) {
    debug!(op, sql = %plan.sql(), args = ?plan.args(), "Executing statement");
}
