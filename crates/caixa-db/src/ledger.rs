//! # Stock Ledger
//!
//! Owns every change to `products.stock`.
//!
//! ## Adjustment Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  (product_id, quantity)[] + mode                                       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  find_active_by_ids ── one read for the whole batch                    │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  pricing::plan_adjustments ── missing ids? negative result? reject all │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  apply_stock_delta × N ── guarded UPDATE per product                   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  caller's scope commits (or the ledger's own BEGIN IMMEDIATE scope)    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use caixa_core::pricing::{plan_adjustments, StockChange};
use caixa_core::{AdjustMode, CoreError, Product, StockAdjustment, StockLevel};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::pool::Database;
use crate::repository::product;

/// Applies a batch on the given connection; all-or-nothing within its scope.
///
/// Nothing is written unless every id resolves and every new level is
/// valid. The caller must hold a write scope (`BEGIN IMMEDIATE`) and roll
/// it back on error.
pub async fn adjust_in(
    conn: &mut SqliteConnection,
    batch: &[StockAdjustment],
    mode: AdjustMode,
) -> ServiceResult<Vec<StockChange>> {
    if batch.is_empty() {
        return Ok(Vec::new());
    }

    let mut ids: Vec<String> = Vec::with_capacity(batch.len());
    for adj in batch {
        if !ids.contains(&adj.product_id) {
            ids.push(adj.product_id.clone());
        }
    }

    let current: HashMap<String, Product> = product::find_active_by_ids(conn, &ids)
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

    let changes = plan_adjustments(&current, batch, mode)?;
    let now = Utc::now();

    for change in &changes {
        let delta = change.delta();
        if delta == 0 {
            continue;
        }
        if !product::apply_stock_delta(conn, &change.product_id, delta, now).await? {
            return Err(guard_rejection(conn, change).await);
        }
    }

    debug!(mode = %mode, products = changes.len(), "Stock batch applied");
    Ok(changes)
}

/// Explains why a guarded update matched no row.
async fn guard_rejection(conn: &mut SqliteConnection, change: &StockChange) -> ServiceError {
    match product::find_by_id(conn, &change.product_id).await {
        Ok(Some(p)) if p.is_active => CoreError::InsufficientStock {
            product: p.name,
            available: p.stock,
            requested: change.previous - change.new_stock,
        }
        .into(),
        Ok(_) => CoreError::ids_not_found([change.product_id.clone()]).into(),
        Err(err) => err.into(),
    }
}

/// Standalone ledger; each call is its own write scope.
#[derive(Debug, Clone)]
pub struct StockLedger {
    db: Database,
}

impl StockLedger {
    pub fn new(db: Database) -> Self {
        StockLedger { db }
    }

    /// Adjusts one product.
    pub async fn adjust(
        &self,
        product_id: &str,
        quantity: i64,
        mode: AdjustMode,
    ) -> ServiceResult<StockChange> {
        let mut changes = self
            .adjust_batch(&[StockAdjustment::new(product_id, quantity)], mode)
            .await?;
        changes
            .pop()
            .ok_or_else(|| CoreError::ids_not_found([product_id]).into())
    }

    /// Adjusts many products atomically.
    ///
    /// ## Errors
    /// - `ProductNotFound` listing every missing or inactive id
    /// - `InsufficientStock` when a subtract would go below zero
    /// - `InvalidAdjustment` for negative quantities
    pub async fn adjust_batch(
        &self,
        batch: &[StockAdjustment],
        mode: AdjustMode,
    ) -> ServiceResult<Vec<StockChange>> {
        let mut tx = self.db.begin_immediate().await?;

        match adjust_in(&mut tx, batch, mode).await {
            Ok(changes) => {
                tx.commit().await?;
                for change in &changes {
                    info!(
                        product_id = %change.product_id,
                        mode = %mode,
                        previous = change.previous,
                        new_stock = change.new_stock,
                        "Stock adjusted"
                    );
                }
                Ok(changes)
            }
            Err(err) => {
                warn!(mode = %mode, error = %err, "Stock adjustment rejected");
                Err(err)
            }
        }
    }

    /// Reads the current stock of an active product.
    ///
    /// ## Errors
    /// - `ProductNotFound` - unknown or inactive id
    /// - `StockConsistency` - stored stock is negative
    pub async fn check_stock(&self, product_id: &str) -> ServiceResult<StockLevel> {
        let mut conn = self.db.pool().acquire().await?;
        let product = product::find_by_id(&mut conn, product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| CoreError::ids_not_found([product_id]))?;

        if product.stock < 0 {
            warn!(product_id = %product.id, stock = product.stock, "Negative stock observed");
            return Err(CoreError::StockConsistency {
                product_id: product.id,
                stock: product.stock,
            }
            .into());
        }

        Ok(StockLevel {
            product_id: product.id,
            name: product.name,
            current_stock: product.stock,
        })
    }
}
