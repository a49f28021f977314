//! Commit and rollback failures of self-managed transactions.

mod common;

use common::*;
use oxide_repo::{
    Backend, Dialect, ExecResult, Query, RepoError, Repository, Result, Row, SqliteBackend,
};
use oxide_repo_core::StatementPlan;

/// SQLite backend whose commits or rollbacks report failure after running.
struct Unfinishable {
    inner: SqliteBackend,
    fail_commit: bool,
}

impl Unfinishable {
    fn new(pool: sqlx::SqlitePool, fail_commit: bool) -> Self {
        Self {
            inner: SqliteBackend::new(pool),
            fail_commit,
        }
    }
}

impl Backend for Unfinishable {
    const NAME: &'static str = "sqlite";

    type Tx = <SqliteBackend as Backend>::Tx;

    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    async fn begin(&self) -> Result<Self::Tx> {
        self.inner.begin().await
    }

    async fn commit(&self, tx: Self::Tx) -> Result<()> {
        if self.fail_commit {
            self.inner.rollback(tx).await?;
            return Err(RepoError::Database(sqlx::Error::PoolClosed));
        }
        self.inner.commit(tx).await
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<()> {
        self.inner.rollback(tx).await?;
        Err(RepoError::Database(sqlx::Error::PoolClosed))
    }

    async fn query(&self, tx: &mut Self::Tx, plan: &StatementPlan) -> Result<Vec<Row>> {
        self.inner.query(tx, plan).await
    }

    async fn exec(&self, tx: &mut Self::Tx, plan: &StatementPlan) -> Result<ExecResult> {
        self.inner.exec(tx, plan).await
    }
}

#[tokio::test]
async fn test_failed_rollback_keeps_both_errors() {
    let pool = create_test_pool().await;
    let plain = Repository::<User, _>::new(SqliteBackend::new(pool.clone())).unwrap();
    plain
        .create(&User::new("alice@example.com", "alice", Some(31), None))
        .await
        .unwrap();

    let users = Repository::<User, _>::new(Unfinishable::new(pool, false)).unwrap();
    let err = users
        .create(&User::new("alice@example.com", "impostor", None, None))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("rollback error"));
    match err {
        RepoError::Rollback { source, rollback } => {
            assert!(matches!(*source, RepoError::Database(sqlx::Error::Database(_))));
            assert!(matches!(*rollback, RepoError::Database(sqlx::Error::PoolClosed)));
        }
        other => panic!("unexpected error: {other}"),
    }

    let all = plain.query(&Query::new()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "alice");
}

#[tokio::test]
async fn test_successful_operation_skips_rollback() {
    let pool = create_test_pool().await;
    let users = Repository::<User, _>::new(Unfinishable::new(pool, false)).unwrap();

    let id = users
        .create(&User::new("bob@example.com", "bob", None, None))
        .await
        .unwrap();
    assert_eq!(id, 1);
}

#[tokio::test]
async fn test_failed_commit_is_wrapped() {
    let pool = create_test_pool().await;
    let plain = Repository::<User, _>::new(SqliteBackend::new(pool.clone())).unwrap();
    let users = Repository::<User, _>::new(Unfinishable::new(pool, true)).unwrap();

    let err = users
        .create(&User::new("bob@example.com", "bob", None, None))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("commit error"));
    assert!(matches!(err, RepoError::Commit { .. }));

    assert!(plain.query(&Query::new()).await.unwrap().is_empty());
}
