//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Two Surfaces
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Free functions (take &mut SqliteConnection)                           │
//! │  ├── find_active_by_barcodes   ← Cart Validator, one batched read      │
//! │  ├── find_active_by_ids        ← Stock Ledger, one batched read        │
//! │  ├── find_by_id                                                        │
//! │  └── apply_stock_delta         ← guarded UPDATE, never below zero      │
//! │       Usable inside a caller's transaction: pass `&mut *tx`.           │
//! │                                                                         │
//! │  ProductRepository (owns a pool clone)                                 │
//! │  └── catalogue CRUD: insert, list, lookups, search, update, activate   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use caixa_core::{Category, Product};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

const PRODUCT_COLUMNS: &str =
    "id, barcode, name, price_cents, stock, category, is_active, created_at, updated_at";

/// Largest IN-list sent in one statement.
const BATCH_CHUNK: usize = 500;

// =============================================================================
// In-Scope Operations
// =============================================================================

/// Loads every active product whose barcode is in `barcodes`.
///
/// Unknown and inactive barcodes are simply absent from the result.
pub async fn find_active_by_barcodes(
    conn: &mut SqliteConnection,
    barcodes: &[String],
) -> DbResult<Vec<Product>> {
    find_active_where_in(conn, "barcode", barcodes).await
}

/// Loads every active product whose id is in `ids`.
pub async fn find_active_by_ids(
    conn: &mut SqliteConnection,
    ids: &[String],
) -> DbResult<Vec<Product>> {
    find_active_where_in(conn, "id", ids).await
}

async fn find_active_where_in(
    conn: &mut SqliteConnection,
    column: &'static str,
    keys: &[String],
) -> DbResult<Vec<Product>> {
    let mut products = Vec::with_capacity(keys.len());

    for chunk in keys.chunks(BATCH_CHUNK) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 AND {column} IN ("
        ));
        let mut separated = builder.separated(", ");
        for key in chunk {
            separated.push_bind(key.as_str());
        }
        separated.push_unseparated(")");

        let rows = builder
            .build_query_as::<Product>()
            .fetch_all(&mut *conn)
            .await?;
        products.extend(rows);
    }

    debug!(column, requested = keys.len(), found = products.len(), "Batch product lookup");
    Ok(products)
}

/// Gets a product by id, active or not.
pub async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Applies a signed stock change to an active product.
///
/// ## Guarded Update
/// ```text
/// UPDATE products SET stock = stock + Δ
/// WHERE id = ? AND is_active = 1 AND stock + Δ >= 0
/// ```
/// Returns `false` when no row matched: the product vanished, was
/// deactivated, or the change would have driven stock negative.
pub async fn apply_stock_delta(
    conn: &mut SqliteConnection,
    id: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(id = %id, delta, "Applying stock delta");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET
            stock = stock + ?1,
            updated_at = ?2
        WHERE id = ?3
          AND is_active = 1
          AND stock + ?1 >= 0
        "#,
    )
    .bind(delta)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Product Repository
// =============================================================================

/// Repository for catalogue operations outside any sale scope.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - barcode already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(barcode = %product.barcode, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, barcode, name, price_cents, stock,
                category, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.category)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        find_by_id(&mut conn, id).await
    }

    /// Gets an active product by its ID.
    pub async fn get_active_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        Ok(self.get_by_id(id).await?.filter(|p| p.is_active))
    }

    /// Gets a product by barcode, active or not.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1"
        ))
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets an active product by barcode.
    pub async fn get_active_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        Ok(self.get_by_barcode(barcode).await?.filter(|p| p.is_active))
    }

    /// Searches active products by category and/or name fragment.
    ///
    /// The name match is a case-insensitive substring match.
    pub async fn search(
        &self,
        category: Option<Category>,
        name: Option<&str>,
    ) -> DbResult<Vec<Product>> {
        debug!(?category, ?name, "Searching products");

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1"
        ));

        if let Some(category) = category {
            builder.push(" AND category = ").push_bind(category);
        }

        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            builder
                .push(" AND LOWER(name) LIKE ")
                .push_bind(format!("%{}%", escape_like(&name.to_lowercase())))
                .push(" ESCAPE '\\'");
        }

        builder.push(" ORDER BY name, id");

        let products = builder
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Updates catalogue fields (name, barcode, price, category).
    ///
    /// Stock is not touched; it only moves through the ledger.
    ///
    /// ## Returns
    /// * `Ok(false)` - no product with this id
    pub async fn update_details(&self, product: &Product) -> DbResult<bool> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                barcode = ?2,
                name = ?3,
                price_cents = ?4,
                category = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.category)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Flips the soft-delete flag. Returns `false` if the id is unknown.
    pub async fn set_active(&self, id: &str, active: bool, now: DateTime<Utc>) -> DbResult<bool> {
        debug!(id = %id, active, "Setting product active flag");

        let result = sqlx::query("UPDATE products SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
