//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (inside the coordinator's write scope)                      │
//! │     └── insert_sale() → sales row + every sale_items row               │
//! │                                                                         │
//! │  2. READ                                                               │
//! │     ├── find_sale()        → Sale with items, cart order               │
//! │     └── count / list_page  → filtered, newest first                    │
//! │                                                                         │
//! │  There is no step 3. Sales are never updated or deleted.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use caixa_core::{PaymentMethod, Sale, SaleItem};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

const SALE_COLUMNS: &str = "id, total_cents, payment_method, created_at";

const ITEM_COLUMNS: &str = "id, sale_id, line_no, product_id, barcode, product_name, \
                            quantity, unit_price_cents, subtotal_cents";

/// Inclusive `created_at` window plus optional payment method.
#[derive(Debug, Clone, Copy)]
pub struct SaleWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub payment_method: Option<PaymentMethod>,
}

// =============================================================================
// In-Scope Operations
// =============================================================================

/// Persists a sale and all of its items.
///
/// Call with `&mut *tx` so the rows become visible together with the stock
/// decrements of the same scope.
pub async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, items = sale.items.len(), "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (id, total_cents, payment_method, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&sale.id)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    for item in &sale.items {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, line_no, product_id, barcode, product_name,
                quantity, unit_price_cents, subtotal_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(item.line_no)
        .bind(&item.product_id)
        .bind(&item.barcode)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.subtotal_cents)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Gets a sale with its items in cart order.
pub async fn find_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(mut sale) = sale else {
        return Ok(None);
    };

    sale.items = sqlx::query_as::<_, SaleItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY line_no"
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(sale))
}

/// Counts sales inside the window.
pub async fn count_sales(conn: &mut SqliteConnection, window: &SaleWindow) -> DbResult<i64> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM sales");
    push_window(&mut builder, window);

    let total: i64 = builder
        .build_query_scalar::<i64>()
        .fetch_one(&mut *conn)
        .await?;

    Ok(total)
}

/// Lists one page of sales inside the window, newest first, with items.
pub async fn list_sales(
    conn: &mut SqliteConnection,
    window: &SaleWindow,
    limit: i64,
    offset: i64,
) -> DbResult<Vec<Sale>> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {SALE_COLUMNS} FROM sales"));
    push_window(&mut builder, window);
    builder
        .push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let mut sales = builder
        .build_query_as::<Sale>()
        .fetch_all(&mut *conn)
        .await?;

    let ids: Vec<String> = sales.iter().map(|s| s.id.clone()).collect();
    let mut items = load_items(conn, &ids).await?;
    for sale in &mut sales {
        sale.items = items.remove(&sale.id).unwrap_or_default();
    }

    Ok(sales)
}

/// Loads items for many sales in one query, grouped by sale id.
async fn load_items(
    conn: &mut SqliteConnection,
    sale_ids: &[String],
) -> DbResult<HashMap<String, Vec<SaleItem>>> {
    let mut grouped: HashMap<String, Vec<SaleItem>> = HashMap::new();
    if sale_ids.is_empty() {
        return Ok(grouped);
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id IN ("
    ));
    let mut separated = builder.separated(", ");
    for id in sale_ids {
        separated.push_bind(id.as_str());
    }
    separated.push_unseparated(") ORDER BY sale_id, line_no");

    let rows = builder
        .build_query_as::<SaleItem>()
        .fetch_all(&mut *conn)
        .await?;

    for item in rows {
        grouped.entry(item.sale_id.clone()).or_default().push(item);
    }
    Ok(grouped)
}

fn push_window(builder: &mut QueryBuilder<'_, Sqlite>, window: &SaleWindow) {
    builder
        .push(" WHERE created_at >= ")
        .push_bind(window.start)
        .push(" AND created_at <= ")
        .push_bind(window.end);

    if let Some(method) = window.payment_method {
        builder.push(" AND payment_method = ").push_bind(method);
    }
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}
