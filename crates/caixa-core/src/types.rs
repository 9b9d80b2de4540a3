//! # Domain Types
//!
//! Core domain types used throughout Caixa POS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    CartLine     │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  barcode        │   │  id (UUID)      │       │
//! │  │  barcode (uniq) │   │  quantity       │   │  total_cents    │       │
//! │  │  price_cents    │   └───────┬─────────┘   │  payment_method │       │
//! │  │  stock          │           │ validate    │  items[]        │       │
//! │  │  category       │           ▼             └────────┬────────┘       │
//! │  │  is_active      │   ┌─────────────────┐            │                │
//! │  └─────────────────┘   │  ValidatedItem  │ ─────────► SaleItem         │
//! │                        │  price snapshot │  persist   (immutable)      │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! CartLine and ValidatedItem are never persisted. Sale and SaleItem are
//! written once and never updated.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ValidationError};
use crate::money::Money;
use crate::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

// =============================================================================
// Category
// =============================================================================

/// Product category (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Beverages,
    Food,
    Hygiene,
    Cleaning,
    Other,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 5] = [
        Category::Beverages,
        Category::Food,
        Category::Hygiene,
        Category::Cleaning,
        Category::Other,
    ];

    /// Stored/wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Beverages => "BEVERAGES",
            Category::Food => "FOOD",
            Category::Hygiene => "HYGIENE",
            Category::Cleaning => "CLEANING",
            Category::Other => "OTHER",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: Category::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Barcode (EAN-13, UPC-A, internal code...). Unique across all products.
    pub barcode: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Price in cents (smallest currency unit). Never negative.
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    pub category: Category,

    /// Soft-delete flag. Inactive products cannot be sold or adjusted.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Fields for a product about to be created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub barcode: String,
    pub price_cents: i64,
    pub stock: i64,
    pub category: Category,
}

/// Catalogue changes to an existing product.
///
/// Stock is deliberately absent: it only moves through the stock ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub barcode: Option<String>,
    pub price_cents: Option<i64>,
    pub category: Option<Category>,
}

impl ProductUpdate {
    /// Applies the present fields on top of `product`.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.trim().to_string();
        }
        if let Some(barcode) = &self.barcode {
            product.barcode = barcode.trim().to_string();
        }
        if let Some(price) = self.price_cents {
            product.price_cents = price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    DebitCard,
    CreditCard,
    InstantTransfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::DebitCard,
        PaymentMethod::CreditCard,
        PaymentMethod::InstantTransfer,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::InstantTransfer => "INSTANT_TRANSFER",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One (barcode, quantity) request within a not-yet-committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub barcode: String,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(barcode: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            barcode: barcode.into(),
            quantity,
        }
    }
}

/// A cart line resolved against a live product.
///
/// `unit_price_cents` is a snapshot taken at validation time; a concurrent
/// price change cannot alter it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedItem {
    pub product_id: String,
    pub barcode: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// quantity × unit price, exactly.
    pub subtotal_cents: i64,
}

impl ValidatedItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Sum of all item subtotals.
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    /// Items in cart order.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<SaleItem>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Number of lines on the sale.
    #[inline]
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// Checks `total == Σ subtotals` and `subtotal == qty × unit` per item.
    pub fn is_consistent(&self) -> bool {
        let items_ok = self.items.iter().all(|item| {
            item.unit_price()
                .checked_multiply_quantity(item.quantity)
                .map(|expected| expected.cents() == item.subtotal_cents)
                .unwrap_or(false)
        });
        let sum: Money = self.items.iter().map(SaleItem::subtotal).sum();
        items_ok && sum == self.total()
    }
}

/// A line of a committed sale.
///
/// Product name and barcode are copied onto the item so historical receipts
/// stay correct after the product is renamed or deactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// Position in the original cart, starting at 0.
    pub line_no: i64,
    pub product_id: String,
    pub barcode: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Stock
// =============================================================================

/// How a ledger adjustment combines with the current stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustMode {
    Add,
    Subtract,
    Set,
}

impl AdjustMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AdjustMode::Add => "add",
            AdjustMode::Subtract => "subtract",
            AdjustMode::Set => "set",
        }
    }
}

impl fmt::Display for AdjustMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdjustMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" => Ok(AdjustMode::Add),
            "subtract" => Ok(AdjustMode::Subtract),
            "set" => Ok(AdjustMode::Set),
            other => Err(CoreError::invalid_adjustment(format!(
                "unknown mode '{}', expected add, subtract or set",
                other
            ))),
        }
    }
}

/// One (product id, quantity) pair in a ledger batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: String,
    pub quantity: i64,
}

impl StockAdjustment {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        StockAdjustment {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Stock reading for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: String,
    pub name: String,
    pub current_stock: i64,
}

// =============================================================================
// Sale Queries
// =============================================================================

/// Filters for listing committed sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleFilters {
    /// First day included (whole day). Defaults to today.
    pub start_date: Option<NaiveDate>,
    /// Last day included (whole day). Defaults to today.
    pub end_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    /// 1-based page number.
    pub page: u32,
    /// Page size, 1..=100.
    pub limit: u32,
}

impl Default for SaleFilters {
    fn default() -> Self {
        SaleFilters {
            start_date: None,
            end_date: None,
            payment_method: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl SaleFilters {
    /// Rejects page numbers below 1 and limits outside 1..=100.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page < 1 {
            return Err(ValidationError::MustBePositive {
                field: "page".to_string(),
            });
        }
        if self.limit < 1 || self.limit > MAX_PAGE_LIMIT {
            return Err(ValidationError::OutOfRange {
                field: "limit".to_string(),
                min: 1,
                max: MAX_PAGE_LIMIT as i64,
            });
        }
        Ok(())
    }

    /// Rows to skip: (page − 1) × limit.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1).max(0) * i64::from(self.limit)
    }

    /// Inclusive `created_at` bounds in UTC.
    ///
    /// Both dates are whole days in the reference `offset`: the start is
    /// 00:00:00.000 and the end 23:59:59.999. A missing date falls back to
    /// `today` (already expressed in that offset).
    ///
    /// ## Errors
    /// - `InvalidFormat` - a date at the edge of the calendar whose bound
    ///   cannot be represented in UTC
    pub fn created_at_bounds(
        &self,
        today: NaiveDate,
        offset: FixedOffset,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationError> {
        let start_day = self.start_date.unwrap_or(today);
        let end_day = self.end_date.unwrap_or(today);

        let start = local_to_utc(start_day.and_time(NaiveTime::MIN), offset)
            .ok_or_else(|| date_out_of_range("startDate"))?;
        let end = end_day
            .and_time(NaiveTime::MIN)
            .checked_add_signed(TimeDelta::days(1) - TimeDelta::milliseconds(1))
            .and_then(|local| local_to_utc(local, offset))
            .ok_or_else(|| date_out_of_range("endDate"))?;

        Ok((start, end))
    }
}

fn local_to_utc(local: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let utc = local.checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))?;
    Some(DateTime::<Utc>::from_naive_utc_and_offset(utc, Utc))
}

fn date_out_of_range(field: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "date is out of range".to_string(),
    }
}

/// One page of committed sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePage {
    pub sales: Vec<Sale>,
    /// Count of all sales matching the filters.
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
    /// Sum of `total_cents` over `sales` (this page only).
    pub total_revenue_cents: i64,
}

impl SalePage {
    /// Builds a page, deriving `total_pages` and the page revenue.
    pub fn new(sales: Vec<Sale>, total: i64, page: u32, limit: u32) -> Self {
        let limit_i = i64::from(limit.max(1));
        let total_pages = (total + limit_i - 1) / limit_i;
        let total_revenue_cents = sales.iter().map(Sale::total).sum::<Money>().cents();
        SalePage {
            sales,
            total,
            page,
            limit,
            total_pages,
            total_revenue_cents,
        }
    }

    #[inline]
    pub fn total_revenue(&self) -> Money {
        Money::from_cents(self.total_revenue_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
