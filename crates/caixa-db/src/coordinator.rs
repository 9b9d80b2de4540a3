//! # Sale Transaction Coordinator
//!
//! The single write path for sales.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  commit_sale(lines, payment_method)                                    │
//! │       │                                                                 │
//! │       ├── lines empty? ──► EmptyCart (no lookups)                      │
//! │       │                                                                 │
//! │  ┌────┴──────────────── budget (default 10s) ──────────────────────┐   │
//! │  │    ▼                                                             │   │
//! │  │  BEGIN IMMEDIATE ── write lock held from here                   │   │
//! │  │    │                                                             │   │
//! │  │    ▼                                                             │   │
//! │  │  validate_in ── fresh stock, price snapshot                     │   │
//! │  │    │                                                             │   │
//! │  │    ▼                                                             │   │
//! │  │  ledger::adjust_in(Subtract) ── guarded decrements              │   │
//! │  │    │                                                             │   │
//! │  │    ▼                                                             │   │
//! │  │  assemble_sale + insert_sale                                    │   │
//! │  └────┬─────────────────────────────────────────────────────────────┘   │
//! │       │  elapsed? ──► scope dropped, rolled back ──► TransactionTimeout │
//! │       ▼                                                                 │
//! │  COMMIT ── decrements and sale rows become visible together            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The commit statement runs after the budget check. A timeout therefore
//! never leaves persisted effects behind, and a sale reported as committed
//! is never rolled back.

use std::time::{Duration, Instant};

use caixa_core::pricing::{assemble_sale, demand_by_product};
use caixa_core::{AdjustMode, CartLine, CoreError, PaymentMethod, Sale};
use chrono::{SubsecRound, Utc};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, ServiceError, ServiceResult};
use crate::ledger;
use crate::pool::Database;
use crate::repository::sale::{self, generate_sale_id, generate_sale_item_id};
use crate::validator;

/// Commits sales atomically within a time budget.
#[derive(Debug, Clone)]
pub struct SaleCoordinator {
    db: Database,
    budget: Duration,
}

impl SaleCoordinator {
    pub fn new(db: Database, budget: Duration) -> Self {
        SaleCoordinator { db, budget }
    }

    /// The configured budget.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Validates the cart, decrements stock and records the sale, all or nothing.
    ///
    /// ## Errors
    /// - `EmptyCart` - no lines
    /// - `Validation` - malformed line
    /// - `ProductNotFound` - unknown or inactive barcode
    /// - `InsufficientStock` - not enough stock at commit time
    /// - `TransactionTimeout` - budget elapsed; nothing was persisted
    pub async fn commit_sale(
        &self,
        lines: &[CartLine],
        payment_method: PaymentMethod,
    ) -> ServiceResult<Sale> {
        if lines.is_empty() {
            warn!("Rejected sale: cart is empty");
            return Err(CoreError::EmptyCart.into());
        }

        let started = Instant::now();
        let budget_ms = u64::try_from(self.budget.as_millis()).unwrap_or(u64::MAX);

        let staged = match tokio::time::timeout(self.budget, self.stage(lines, payment_method)).await
        {
            Ok(Ok(staged)) => staged,
            Ok(Err(err)) => {
                if let ServiceError::Domain(domain) = &err {
                    warn!(error = %domain, lines = lines.len(), "Rejected sale");
                }
                return Err(err);
            }
            Err(_elapsed) => {
                warn!(budget_ms, lines = lines.len(), "Sale exceeded its budget, rolled back");
                return Err(CoreError::TransactionTimeout { budget_ms }.into());
            }
        };

        let (tx, sale) = staged;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale.id,
            total = %sale.total(),
            items = sale.total_items(),
            payment_method = %sale.payment_method,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Sale committed"
        );
        Ok(sale)
    }

    /// Everything up to, not including, COMMIT.
    ///
    /// Any early return drops the transaction, which rolls it back.
    async fn stage(
        &self,
        lines: &[CartLine],
        payment_method: PaymentMethod,
    ) -> ServiceResult<(Transaction<'static, Sqlite>, Sale)> {
        let mut tx = self.db.begin_immediate().await?;
        debug!(lines = lines.len(), "Write scope opened");

        let items = validator::validate_in(&mut tx, lines).await?;

        let batch = demand_by_product(&items);
        ledger::adjust_in(&mut tx, &batch, AdjustMode::Subtract).await?;

        let sale = assemble_sale(
            generate_sale_id(),
            payment_method,
            Utc::now().trunc_subsecs(3),
            &items,
            generate_sale_item_id,
        )?;
        sale::insert_sale(&mut tx, &sale).await?;

        Ok((tx, sale))
    }
}
