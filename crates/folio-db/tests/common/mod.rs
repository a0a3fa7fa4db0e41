//! Shared fixtures for folio-db integration tests.

#![allow(dead_code)]

use std::time::Duration;

use folio_core::{Book, Money, NewBook};
use folio_db::{Database, DbConfig};
use tempfile::TempDir;

/// Single-connection in-memory database.
pub async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// File database with a real multi-connection pool. Keep the `TempDir`
/// alive for as long as the database is used.
pub async fn file_db(max_connections: u32) -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::new(dir.path().join("folio.db"))
        .max_connections(max_connections)
        .busy_timeout(Duration::from_secs(30));
    let db = Database::new(config).await.unwrap();
    (dir, db)
}

pub async fn book(db: &Database, title: &str, cents: i64) -> Book {
    db.catalog()
        .register(&NewBook {
            title: title.to_string(),
            author_id: "author".to_string(),
            genre_id: "genre".to_string(),
            price: Money::from_cents(cents),
        })
        .await
        .unwrap()
}
