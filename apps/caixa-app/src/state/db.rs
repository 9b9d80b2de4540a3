//! # Database State
//!
//! Wraps the `Database` together with the sale engine settings.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn commit_sale(db: &DbState, ...) -> Result<SaleDto, ApiError> {
//!     let sale = db.coordinator().commit_sale(&lines, method).await?;
//!     Ok(SaleDto::from(sale))
//! }
//! ```

use std::time::Duration;

use caixa_db::{Database, SaleCoordinator, SaleQueryService};
use chrono::FixedOffset;

/// Database plus the commit budget and the reference offset for listings.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
    commit_budget: Duration,
    reference_offset: FixedOffset,
}

impl DbState {
    pub fn new(db: Database, commit_budget: Duration, reference_offset: FixedOffset) -> Self {
        DbState {
            db,
            commit_budget,
            reference_offset,
        }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }

    /// Sale coordinator bound to the configured budget.
    pub fn coordinator(&self) -> SaleCoordinator {
        self.db.coordinator(self.commit_budget)
    }

    /// Query service bound to the configured reference offset.
    pub fn queries(&self) -> SaleQueryService {
        self.db.queries(self.reference_offset)
    }

    pub fn commit_budget(&self) -> Duration {
        self.commit_budget
    }

    pub fn reference_offset(&self) -> FixedOffset {
        self.reference_offset
    }
}
