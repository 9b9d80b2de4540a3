//! # Stock Commands
//!
//! Standalone ledger calls. Each runs in its own write scope.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::DbState;
use caixa_core::pricing::StockChange;
use caixa_core::{AdjustMode, StockAdjustment, StockLevel};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChangeDto {
    pub product_id: String,
    pub product_name: String,
    pub previous_stock: i64,
    pub new_stock: i64,
}

impl From<StockChange> for StockChangeDto {
    fn from(c: StockChange) -> Self {
        StockChangeDto {
            product_id: c.product_id,
            product_name: c.product_name,
            previous_stock: c.previous,
            new_stock: c.new_stock,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevelDto {
    pub product_id: String,
    pub name: String,
    pub current_stock: i64,
}

impl From<StockLevel> for StockLevelDto {
    fn from(l: StockLevel) -> Self {
        StockLevelDto {
            product_id: l.product_id,
            name: l.name,
            current_stock: l.current_stock,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentDto {
    pub product_id: String,
    pub quantity: i64,
}

/// Adjusts one product. `mode` is "add", "subtract" or "set".
pub async fn adjust_stock(
    db: &DbState,
    product_id: String,
    quantity: i64,
    mode: String,
) -> Result<StockChangeDto, ApiError> {
    debug!(product_id = %product_id, quantity, mode = %mode, "adjust_stock command");
    let mode: AdjustMode = mode.parse()?;
    let change = db.inner().ledger().adjust(&product_id, quantity, mode).await?;
    Ok(change.into())
}

/// Adjusts many products at once; nothing is applied unless all succeed.
pub async fn adjust_stock_batch(
    db: &DbState,
    adjustments: Vec<AdjustmentDto>,
    mode: String,
) -> Result<Vec<StockChangeDto>, ApiError> {
    debug!(count = adjustments.len(), mode = %mode, "adjust_stock_batch command");
    let mode: AdjustMode = mode.parse()?;
    let batch: Vec<StockAdjustment> = adjustments
        .into_iter()
        .map(|a| StockAdjustment::new(a.product_id, a.quantity))
        .collect();
    let changes = db.inner().ledger().adjust_batch(&batch, mode).await?;
    Ok(changes.into_iter().map(StockChangeDto::from).collect())
}

pub async fn check_stock(db: &DbState, product_id: String) -> Result<StockLevelDto, ApiError> {
    debug!(product_id = %product_id, "check_stock command");
    Ok(db.inner().ledger().check_stock(&product_id).await?.into())
}
