//! Shared fixtures for caixa-db integration tests.

#![allow(dead_code)]

use std::time::Duration;

use caixa_core::{Category, NewProduct, Product};
use caixa_db::{Database, DbConfig};
use tempfile::TempDir;

pub const BUDGET: Duration = Duration::from_secs(10);

/// Single-connection in-memory database with migrations applied.
pub async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// File-backed database with a multi-connection pool.
pub async fn file_db(dir: &TempDir, max_connections: u32) -> Database {
    let config = DbConfig::new(dir.path().join("caixa-test.db"))
        .max_connections(max_connections)
        .busy_timeout(Duration::from_secs(5));
    Database::new(config).await.unwrap()
}

pub async fn add_product(
    db: &Database,
    name: &str,
    barcode: &str,
    price_cents: i64,
    stock: i64,
) -> Product {
    db.catalog()
        .create(NewProduct {
            name: name.to_string(),
            barcode: barcode.to_string(),
            price_cents,
            stock,
            category: Category::Beverages,
        })
        .await
        .unwrap()
}

/// Reads stock straight from the table, active or not.
pub async fn stock_of(db: &Database, id: &str) -> i64 {
    sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(id)
        .fetch_one(db.pool())
        .await
        .unwrap()
}

pub async fn sale_rows(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM sales")
        .fetch_one(db.pool())
        .await
        .unwrap()
}

pub async fn item_rows(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
        .fetch_one(db.pool())
        .await
        .unwrap()
}
