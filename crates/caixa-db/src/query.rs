//! # Sale Query Service
//!
//! Read side of committed sales: lookups and filtered, paginated listings.
//!
//! ## Day Bounds
//! ```text
//! filters.start_date = 2026-03-14, reference offset UTC-03:00
//!
//!   local  2026-03-14 00:00:00.000  ──►  UTC 2026-03-14 03:00:00.000
//!   local  2026-03-14 23:59:59.999  ──►  UTC 2026-03-15 02:59:59.999
//! ```
//! Missing dates default to "today" in the reference offset.
//!
//! `total_revenue` sums the returned page only, not the whole filtered set.

use caixa_core::{CoreError, Sale, SaleFilters, SalePage};
use chrono::{DateTime, FixedOffset, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::ServiceResult;
use crate::repository::sale::{self, SaleWindow};

/// Read-only access to committed sales.
#[derive(Debug, Clone)]
pub struct SaleQueryService {
    pool: SqlitePool,
    reference_offset: FixedOffset,
}

impl SaleQueryService {
    pub fn new(pool: SqlitePool, reference_offset: FixedOffset) -> Self {
        SaleQueryService {
            pool,
            reference_offset,
        }
    }

    /// Lists sales matching `filters`, newest first.
    ///
    /// ## Errors
    /// - `Validation` - page below 1, limit outside 1..=100, or a date
    ///   too close to the calendar edge to bound
    pub async fn list_sales(&self, filters: &SaleFilters) -> ServiceResult<SalePage> {
        self.list_sales_as_of(filters, Utc::now()).await
    }

    /// Same as [`list_sales`](Self::list_sales) with an explicit clock.
    pub async fn list_sales_as_of(
        &self,
        filters: &SaleFilters,
        now: DateTime<Utc>,
    ) -> ServiceResult<SalePage> {
        filters.validate()?;

        let today = now.with_timezone(&self.reference_offset).date_naive();
        let (start, end) = filters.created_at_bounds(today, self.reference_offset)?;

        if start > end {
            debug!(%start, %end, "Empty date range");
            return Ok(SalePage::new(Vec::new(), 0, filters.page, filters.limit));
        }

        let window = SaleWindow {
            start,
            end,
            payment_method: filters.payment_method,
        };

        // Count and page from the same snapshot.
        let mut tx = self.pool.begin().await?;
        let total = sale::count_sales(&mut tx, &window).await?;
        let sales = sale::list_sales(&mut tx, &window, i64::from(filters.limit), filters.offset())
            .await?;
        tx.commit().await?;

        debug!(
            total,
            returned = sales.len(),
            page = filters.page,
            "Listed sales"
        );
        Ok(SalePage::new(sales, total, filters.page, filters.limit))
    }

    /// Gets one sale with its items.
    ///
    /// ## Errors
    /// - `SaleNotFound` - no sale with this id
    pub async fn get_sale(&self, id: &str) -> ServiceResult<Sale> {
        let mut conn = self.pool.acquire().await?;
        sale::find_sale(&mut conn, id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()).into())
    }
}
