#![allow(dead_code)]

use chrono::{DateTime, Utc};
use oxide_repo::{Repository, SqliteBackend};
use oxide_repo_derive::{AggregateRow, Record};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

#[derive(Debug, Clone, PartialEq, Record)]
#[record(collection = "users", package = "user")]
pub struct User {
    #[column(ident, auto)]
    pub id: i64,
    pub email: String,
    pub name: String,
    pub age: Option<i32>,
    pub group_res: Option<String>,
    #[column(comparable)]
    pub updated_at: Option<DateTime<Utc>>,
    #[column(auto, comparable)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, AggregateRow)]
pub struct GroupCount {
    pub group_res: Option<String>,
    pub count: i64,
}

impl User {
    pub fn new(email: &str, name: &str, age: Option<i32>, group: Option<&str>) -> Self {
        Self {
            id: 0,
            email: email.to_string(),
            name: name.to_string(),
            age,
            group_res: group.map(str::to_string),
            updated_at: None,
            created_at: DateTime::<Utc>::default(),
        }
    }
}

pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");

    sqlx::query(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL DEFAULT '' UNIQUE,
            name TEXT NOT NULL DEFAULT '',
            age INTEGER,
            group_res TEXT,
            updated_at TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(&pool)
    .await
    .expect("Failed to create users table");

    pool
}

pub async fn users_repository() -> Repository<User, SqliteBackend> {
    let pool = create_test_pool().await;
    Repository::new(SqliteBackend::new(pool)).expect("Failed to build users repository")
}

pub async fn seed(users: &Repository<User, SqliteBackend>) {
    users
        .create_many(&[
            User::new("alice@example.com", "alice", Some(31), Some("admin")),
            User::new("bob@example.com", "bob", Some(17), Some("staff")),
            User::new("carol@example.com", "carol", Some(45), Some("staff")),
            User::new("dave@example.com", "dave", None, None),
        ])
        .await
        .expect("Failed to seed users");
}
