//! # Sale Commands
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  preview_cart(lines)            read-only, stock may still change       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  commit_sale(lines, method)     one atomic, time-boxed unit             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  get_receipt(sale_id)           sale + establishment info               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Malformed input (unknown payment method, bad dates) is rejected here,
//! before the sale engine sees it.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::StoreInfo;
use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use caixa_core::{
    CartLine, Money, PaymentMethod, Sale, SaleFilters, SaleItem, SalePage, ValidatedItem,
    ValidationError, DEFAULT_PAGE_LIMIT,
};
use caixa_db::CartPreview;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineDto {
    pub barcode: String,
    pub quantity: i64,
}

impl From<CartLineDto> for CartLine {
    fn from(l: CartLineDto) -> Self {
        CartLine::new(l.barcode, l.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLineDto {
    pub product_id: String,
    pub barcode: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl From<ValidatedItem> for PricedLineDto {
    fn from(i: ValidatedItem) -> Self {
        PricedLineDto {
            product_id: i.product_id,
            barcode: i.barcode,
            product_name: i.product_name,
            quantity: i.quantity,
            unit_price_cents: i.unit_price_cents,
            subtotal_cents: i.subtotal_cents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPreviewDto {
    pub items: Vec<PricedLineDto>,
    pub total_cents: i64,
    pub total: String,
}

impl From<CartPreview> for CartPreviewDto {
    fn from(p: CartPreview) -> Self {
        CartPreviewDto {
            items: p.items.into_iter().map(PricedLineDto::from).collect(),
            total_cents: p.total.cents(),
            total: p.total.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemDto {
    pub id: String,
    pub product_id: String,
    pub barcode: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl From<SaleItem> for SaleItemDto {
    fn from(i: SaleItem) -> Self {
        SaleItemDto {
            id: i.id,
            product_id: i.product_id,
            barcode: i.barcode,
            product_name: i.product_name,
            quantity: i.quantity,
            unit_price_cents: i.unit_price_cents,
            subtotal_cents: i.subtotal_cents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDto {
    pub id: String,
    pub total_cents: i64,
    pub total: String,
    pub payment_method: PaymentMethod,
    pub created_at: String,
    pub total_items: usize,
    pub items: Vec<SaleItemDto>,
}

impl From<Sale> for SaleDto {
    fn from(s: Sale) -> Self {
        SaleDto {
            total: s.total().to_string(),
            total_items: s.total_items(),
            id: s.id,
            total_cents: s.total_cents,
            payment_method: s.payment_method,
            created_at: s.created_at.to_rfc3339(),
            items: s.items.into_iter().map(SaleItemDto::from).collect(),
        }
    }
}

/// Listing filters as sent by callers. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSalesRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub payment_method: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalePageDto {
    pub sales: Vec<SaleDto>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
    /// Revenue of the sales on this page.
    pub total_revenue_cents: i64,
    pub total_revenue: String,
}

impl From<SalePage> for SalePageDto {
    fn from(p: SalePage) -> Self {
        SalePageDto {
            total_revenue: p.total_revenue().to_string(),
            sales: p.sales.into_iter().map(SaleDto::from).collect(),
            total: p.total,
            page: p.page,
            limit: p.limit,
            total_pages: p.total_pages,
            total_revenue_cents: p.total_revenue_cents,
        }
    }
}

/// Establishment block on a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptStore {
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

impl From<&StoreInfo> for ReceiptStore {
    fn from(s: &StoreInfo) -> Self {
        ReceiptStore {
            name: s.name.clone(),
            tax_id: s.tax_id.clone(),
            address: s.address.clone(),
            city: s.city.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub name: String,
    pub barcode: String,
    pub quantity: i64,
    pub unit_price: String,
    pub subtotal: String,
}

/// Everything a receipt renderer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub store: ReceiptStore,
    pub sale_id: String,
    pub timestamp: String,
    pub payment_method: PaymentMethod,
    pub lines: Vec<ReceiptLine>,
    pub total_cents: i64,
    pub total: String,
}

// =============================================================================
// Parsing
// =============================================================================

fn parse_payment_method(raw: &str) -> Result<PaymentMethod, ApiError> {
    Ok(raw.parse::<PaymentMethod>()?)
}

/// Timestamps are stored as RFC 3339 text and compared lexically, which
/// only orders correctly for four-digit years.
const DATE_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("expected YYYY-MM-DD ({})", e),
        }
    })?;

    if !DATE_YEARS.contains(&date.year()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "year must be between 1 and 9999".to_string(),
        }
        .into());
    }
    Ok(date)
}

impl ListSalesRequest {
    /// Parses into engine filters; absent paging takes the defaults.
    pub fn into_filters(self) -> Result<SaleFilters, ApiError> {
        Ok(SaleFilters {
            start_date: self
                .start_date
                .as_deref()
                .map(|d| parse_date("startDate", d))
                .transpose()?,
            end_date: self
                .end_date
                .as_deref()
                .map(|d| parse_date("endDate", d))
                .transpose()?,
            // A blank method means no filter.
            payment_method: self
                .payment_method
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(parse_payment_method)
                .transpose()?,
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        })
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Prices a cart without touching stock.
pub async fn preview_cart(
    db: &DbState,
    lines: Vec<CartLineDto>,
) -> Result<CartPreviewDto, ApiError> {
    debug!(lines = lines.len(), "preview_cart command");
    let lines: Vec<CartLine> = lines.into_iter().map(CartLine::from).collect();
    let preview = db.inner().validator().preview(&lines).await?;
    Ok(preview.into())
}

/// Commits a sale: validation, stock decrements and the sale record as one unit.
pub async fn commit_sale(
    db: &DbState,
    lines: Vec<CartLineDto>,
    payment_method: String,
) -> Result<SaleDto, ApiError> {
    debug!(lines = lines.len(), payment_method = %payment_method, "commit_sale command");
    let payment_method = parse_payment_method(&payment_method)?;
    let lines: Vec<CartLine> = lines.into_iter().map(CartLine::from).collect();

    let sale = db.coordinator().commit_sale(&lines, payment_method).await?;
    Ok(sale.into())
}

/// Lists committed sales, newest first.
pub async fn list_sales(db: &DbState, request: ListSalesRequest) -> Result<SalePageDto, ApiError> {
    debug!(?request, "list_sales command");
    let filters = request.into_filters()?;
    let page = db.queries().list_sales(&filters).await?;
    Ok(page.into())
}

pub async fn get_sale(db: &DbState, id: String) -> Result<SaleDto, ApiError> {
    debug!(id = %id, "get_sale command");
    Ok(db.queries().get_sale(&id).await?.into())
}

/// Receipt view: the committed sale plus establishment info.
pub async fn get_receipt(
    db: &DbState,
    config: &ConfigState,
    sale_id: String,
) -> Result<ReceiptResponse, ApiError> {
    debug!(sale_id = %sale_id, "get_receipt command");
    let sale = db.queries().get_sale(&sale_id).await?;
    let receipt = build_receipt(config.store(), sale);
    info!(sale_id = %receipt.sale_id, lines = receipt.lines.len(), "Receipt generated");
    Ok(receipt)
}

fn build_receipt(store: &StoreInfo, sale: Sale) -> ReceiptResponse {
    let total = sale.total();
    ReceiptResponse {
        store: ReceiptStore::from(store),
        timestamp: sale.created_at.to_rfc3339(),
        payment_method: sale.payment_method,
        lines: sale
            .items
            .into_iter()
            .map(|item| ReceiptLine {
                unit_price: Money::from_cents(item.unit_price_cents).to_string(),
                subtotal: Money::from_cents(item.subtotal_cents).to_string(),
                name: item.product_name,
                barcode: item.barcode,
                quantity: item.quantity,
            })
            .collect(),
        total_cents: total.cents(),
        total: total.to_string(),
        sale_id: sale.id,
    }
}
