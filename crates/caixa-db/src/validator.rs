//! # Cart Validator
//!
//! Resolves cart lines against live products and prices them.
//!
//! ```text
//! CartLine[] ──► one batched barcode lookup ──► pricing::price_cart ──► ValidatedItem[]
//! ```
//!
//! Validation never writes. [`validate_in`] runs on whatever connection the
//! caller holds; the coordinator passes its write scope so the stock it
//! checks is the stock it will decrement. [`CartValidator`] is the
//! pool-backed preview used before the cashier confirms payment.

use std::collections::HashMap;

use caixa_core::pricing::{price_cart, sale_total};
use caixa_core::validation::validate_cart_lines;
use caixa_core::{CartLine, Money, Product, ValidatedItem};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::ServiceResult;
use crate::repository::product;

/// Validates `lines` on the given connection.
///
/// ## Errors
/// - `Validation` - blank barcode or non-positive quantity
/// - `ProductNotFound` - a barcode matches no active product
/// - `InsufficientStock` - cumulative demand exceeds stock
pub async fn validate_in(
    conn: &mut SqliteConnection,
    lines: &[CartLine],
) -> ServiceResult<Vec<ValidatedItem>> {
    validate_cart_lines(lines)?;

    let mut barcodes: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        let barcode = line.barcode.trim();
        if !barcodes.iter().any(|b| b == barcode) {
            barcodes.push(barcode.to_string());
        }
    }

    let products: HashMap<String, Product> = product::find_active_by_barcodes(conn, &barcodes)
        .await?
        .into_iter()
        .map(|p| (p.barcode.clone(), p))
        .collect();

    let items = price_cart(lines, &products)?;
    debug!(lines = lines.len(), products = products.len(), "Cart validated");
    Ok(items)
}

/// Priced cart shown before commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartPreview {
    pub items: Vec<ValidatedItem>,
    pub total: Money,
}

/// Pool-backed validator for previews.
#[derive(Debug, Clone)]
pub struct CartValidator {
    pool: SqlitePool,
}

impl CartValidator {
    pub fn new(pool: SqlitePool) -> Self {
        CartValidator { pool }
    }

    /// Validates outside any write scope.
    ///
    /// Stock may change before the sale is committed; the coordinator
    /// validates again.
    pub async fn validate(&self, lines: &[CartLine]) -> ServiceResult<Vec<ValidatedItem>> {
        let mut conn = self.pool.acquire().await?;
        validate_in(&mut conn, lines).await
    }

    /// Validates and totals a cart.
    pub async fn preview(&self, lines: &[CartLine]) -> ServiceResult<CartPreview> {
        let items = self.validate(lines).await?;
        let total = sale_total(&items)?;
        Ok(CartPreview { items, total })
    }
}
