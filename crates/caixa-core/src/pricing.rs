//! # Pricing & Stock Arithmetic
//!
//! The pure half of the sale engine. Storage code in caixa-db reads rows,
//! hands them to these functions, and writes back whatever they decide.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CartLine[] + active products (by barcode)                             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  price_cart() ──► ValidatedItem[]  (input order, price snapshot)       │
//! │        │                                                                │
//! │        ├──► demand_by_product() ──► StockAdjustment[]                  │
//! │        │            │                                                   │
//! │        │            ▼                                                   │
//! │        │     plan_adjustments(Subtract) ──► StockChange[]              │
//! │        │                                                                │
//! │        └──► assemble_sale() ──► Sale { total = Σ subtotals }           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{
    AdjustMode, CartLine, PaymentMethod, Product, Sale, SaleItem, StockAdjustment, ValidatedItem,
};

// =============================================================================
// Cart Pricing
// =============================================================================

/// Resolves and prices cart lines against already-loaded active products.
///
/// `products` maps barcode to product and must only contain active rows.
///
/// ## Rules
/// - Every barcode must resolve, else `ProductNotFound` naming the first miss
/// - Demand is cumulative per product: two lines of 3 against stock 5 fail
/// - One `ValidatedItem` per line, input order preserved
pub fn price_cart(
    lines: &[CartLine],
    products: &HashMap<String, Product>,
) -> CoreResult<Vec<ValidatedItem>> {
    // Resolve everything first so a missing barcode wins over a stock error.
    let resolved = lines
        .iter()
        .map(|line| {
            let barcode = line.barcode.trim();
            products
                .get(barcode)
                .map(|product| (line, product))
                .ok_or_else(|| CoreError::barcode_not_found(barcode))
        })
        .collect::<CoreResult<Vec<_>>>()?;

    let mut demand: HashMap<&str, i64> = HashMap::new();
    let mut items = Vec::with_capacity(resolved.len());

    for (line, product) in resolved {
        if product.stock < 0 {
            return Err(CoreError::StockConsistency {
                product_id: product.id.clone(),
                stock: product.stock,
            });
        }

        let requested = demand.entry(product.id.as_str()).or_insert(0);
        *requested = requested
            .checked_add(line.quantity)
            .ok_or_else(|| overflow("quantity"))?;

        if *requested > product.stock {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested: *requested,
            });
        }

        let subtotal = product
            .price()
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(|| overflow("subtotal"))?;

        items.push(ValidatedItem {
            product_id: product.id.clone(),
            barcode: product.barcode.clone(),
            product_name: product.name.clone(),
            quantity: line.quantity,
            unit_price_cents: product.price_cents,
            subtotal_cents: subtotal.cents(),
        });
    }

    Ok(items)
}

/// Sum of all subtotals. Integer cents, so this is already the rounded total.
pub fn sale_total(items: &[ValidatedItem]) -> CoreResult<Money> {
    items.iter().try_fold(Money::zero(), |acc, item| {
        acc.checked_add(item.subtotal())
            .ok_or_else(|| overflow("total"))
    })
}

/// Collapses validated items into one adjustment per product, in first-seen order.
pub fn demand_by_product(items: &[ValidatedItem]) -> Vec<StockAdjustment> {
    let mut batch: Vec<StockAdjustment> = Vec::new();
    for item in items {
        match batch.iter_mut().find(|adj| adj.product_id == item.product_id) {
            Some(adj) => adj.quantity += item.quantity,
            None => batch.push(StockAdjustment::new(item.product_id.clone(), item.quantity)),
        }
    }
    batch
}

// =============================================================================
// Stock Adjustment Planning
// =============================================================================

/// The decided outcome for one product in a ledger batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: String,
    pub product_name: String,
    pub previous: i64,
    pub new_stock: i64,
}

impl StockChange {
    /// Signed change applied to the stored value.
    #[inline]
    pub fn delta(&self) -> i64 {
        self.new_stock - self.previous
    }
}

/// Decides new stock levels for a batch without touching storage.
///
/// `current` maps product id to the active product as read inside the
/// caller's atomic scope.
///
/// ## Rules
/// ```text
/// add       new = current + q      (q >= 0)
/// subtract  new = current - q      (q >= 0, new >= 0 else InsufficientStock)
/// set       new = q                (q >= 0 else InvalidAdjustment)
/// ```
/// Any id absent from `current` rejects the whole batch, listing every
/// missing id. Repeated ids apply cumulatively, in batch order.
pub fn plan_adjustments(
    current: &HashMap<String, Product>,
    batch: &[StockAdjustment],
    mode: AdjustMode,
) -> CoreResult<Vec<StockChange>> {
    let mut missing: Vec<String> = Vec::new();
    for adj in batch {
        if !current.contains_key(&adj.product_id) && !missing.contains(&adj.product_id) {
            missing.push(adj.product_id.clone());
        }
    }
    if !missing.is_empty() {
        return Err(CoreError::ids_not_found(missing));
    }

    let mut changes: Vec<StockChange> = Vec::new();
    let mut subtracted: HashMap<&str, i64> = HashMap::new();

    for adj in batch {
        if adj.quantity < 0 {
            return Err(CoreError::invalid_adjustment(format!(
                "{} quantity must not be negative (got {})",
                mode, adj.quantity
            )));
        }

        let Some(product) = current.get(&adj.product_id) else {
            continue;
        };
        if product.stock < 0 {
            return Err(CoreError::StockConsistency {
                product_id: product.id.clone(),
                stock: product.stock,
            });
        }

        let index = match changes.iter().position(|c| c.product_id == product.id) {
            Some(index) => index,
            None => {
                changes.push(StockChange {
                    product_id: product.id.clone(),
                    product_name: product.name.clone(),
                    previous: product.stock,
                    new_stock: product.stock,
                });
                changes.len() - 1
            }
        };
        let change = &mut changes[index];

        change.new_stock = match mode {
            AdjustMode::Add => change
                .new_stock
                .checked_add(adj.quantity)
                .ok_or_else(|| CoreError::invalid_adjustment("stock would overflow"))?,
            AdjustMode::Subtract => {
                let total = subtracted.entry(product.id.as_str()).or_insert(0);
                *total = total
                    .checked_add(adj.quantity)
                    .ok_or_else(|| overflow("quantity"))?;
                let remaining = change.new_stock - adj.quantity;
                if remaining < 0 {
                    return Err(CoreError::InsufficientStock {
                        product: product.name.clone(),
                        available: change.previous,
                        requested: *total,
                    });
                }
                remaining
            }
            AdjustMode::Set => adj.quantity,
        };
    }

    Ok(changes)
}

// =============================================================================
// Sale Assembly
// =============================================================================

/// Builds the immutable sale record from validated items.
///
/// `next_item_id` supplies a fresh id per item; ids are the caller's concern
/// so this stays deterministic under test.
pub fn assemble_sale(
    sale_id: String,
    payment_method: PaymentMethod,
    created_at: DateTime<Utc>,
    items: &[ValidatedItem],
    mut next_item_id: impl FnMut() -> String,
) -> CoreResult<Sale> {
    let total = sale_total(items)?;

    let sale_items = items
        .iter()
        .enumerate()
        .map(|(line_no, item)| SaleItem {
            id: next_item_id(),
            sale_id: sale_id.clone(),
            line_no: line_no as i64,
            product_id: item.product_id.clone(),
            barcode: item.barcode.clone(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            subtotal_cents: item.subtotal_cents,
        })
        .collect();

    Ok(Sale {
        id: sale_id,
        total_cents: total.cents(),
        payment_method,
        created_at,
        items: sale_items,
    })
}

fn overflow(field: &str) -> CoreError {
    CoreError::Validation(ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MissingProduct;
    use crate::types::Category;

    fn product(id: &str, barcode: &str, name: &str, price_cents: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            barcode: barcode.to_string(),
            name: name.to_string(),
            price_cents,
            stock,
            category: Category::Beverages,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn by_barcode(products: Vec<Product>) -> HashMap<String, Product> {
        products.into_iter().map(|p| (p.barcode.clone(), p)).collect()
    }

    fn by_id(products: Vec<Product>) -> HashMap<String, Product> {
        products.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    #[test]
    fn test_soda_scenario_prices_line() {
        let catalog = by_barcode(vec![product("p1", "123", "Soda", 250, 5)]);
        let items = price_cart(&[CartLine::new("123", 3)], &catalog).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price_cents, 250);
        assert_eq!(items[0].subtotal_cents, 750);
        assert_eq!(sale_total(&items).unwrap(), Money::from_cents(750));
    }

    #[test]
    fn test_insufficient_stock_reports_details() {
        let catalog = by_barcode(vec![product("p1", "123", "Soda", 250, 2)]);
        let err = price_cart(&[CartLine::new("123", 5)], &catalog).unwrap_err();

        match err {
            CoreError::InsufficientStock {
                product,
                available,
                requested,
            } => {
                assert_eq!(product, "Soda");
                assert_eq!(available, 2);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_barcode_wins_over_stock_error() {
        let catalog = by_barcode(vec![product("p1", "123", "Soda", 250, 1)]);
        let lines = [CartLine::new("123", 5), CartLine::new("999", 1)];
        let err = price_cart(&lines, &catalog).unwrap_err();

        assert!(matches!(
            err,
            CoreError::ProductNotFound(MissingProduct::Barcode(ref b)) if b == "999"
        ));
    }

    #[test]
    fn test_repeated_barcode_checks_cumulative_demand() {
        let catalog = by_barcode(vec![product("p1", "123", "Soda", 250, 5)]);
        let lines = [CartLine::new("123", 3), CartLine::new("123", 3)];
        let err = price_cart(&lines, &catalog).unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock { requested: 6, available: 5, .. }
        ));

        let ok = [CartLine::new("123", 2), CartLine::new("123", 3)];
        let items = price_cart(&ok, &catalog).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(demand_by_product(&items), vec![StockAdjustment::new("p1", 5)]);
    }

    #[test]
    fn test_input_order_preserved() {
        let catalog = by_barcode(vec![
            product("p1", "111", "Water", 100, 10),
            product("p2", "222", "Bread", 450, 10),
        ]);
        let lines = [CartLine::new("222", 1), CartLine::new("111", 2)];
        let items = price_cart(&lines, &catalog).unwrap();

        assert_eq!(items[0].barcode, "222");
        assert_eq!(items[1].barcode, "111");
        assert_eq!(sale_total(&items).unwrap().cents(), 650);
    }

    #[test]
    fn test_plan_subtract_and_add() {
        let current = by_id(vec![product("p1", "123", "Soda", 250, 5)]);

        let sub = plan_adjustments(&current, &[StockAdjustment::new("p1", 3)], AdjustMode::Subtract)
            .unwrap();
        assert_eq!(sub[0].new_stock, 2);
        assert_eq!(sub[0].delta(), -3);

        let add = plan_adjustments(&current, &[StockAdjustment::new("p1", 4)], AdjustMode::Add)
            .unwrap();
        assert_eq!(add[0].new_stock, 9);
    }

    #[test]
    fn test_plan_subtract_below_zero_fails() {
        let current = by_id(vec![product("p1", "123", "Soda", 250, 5)]);
        let batch = [StockAdjustment::new("p1", 3), StockAdjustment::new("p1", 3)];
        let err = plan_adjustments(&current, &batch, AdjustMode::Subtract).unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 5, requested: 6, .. }
        ));
    }

    #[test]
    fn test_plan_set_rejects_negative() {
        let current = by_id(vec![product("p1", "123", "Soda", 250, 5)]);

        let set = plan_adjustments(&current, &[StockAdjustment::new("p1", 0)], AdjustMode::Set)
            .unwrap();
        assert_eq!(set[0].new_stock, 0);

        let err = plan_adjustments(&current, &[StockAdjustment::new("p1", -1)], AdjustMode::Set)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidAdjustment { .. }));
    }

    #[test]
    fn test_plan_lists_every_missing_id() {
        let current = by_id(vec![product("p1", "123", "Soda", 250, 5)]);
        let batch = [
            StockAdjustment::new("p1", 1),
            StockAdjustment::new("ghost-a", 1),
            StockAdjustment::new("ghost-b", 1),
            StockAdjustment::new("ghost-a", 2),
        ];
        let err = plan_adjustments(&current, &batch, AdjustMode::Add).unwrap_err();

        match err {
            CoreError::ProductNotFound(MissingProduct::Ids(ids)) => {
                assert_eq!(ids, vec!["ghost-a".to_string(), "ghost-b".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_plan_flags_negative_stored_stock() {
        let current = by_id(vec![product("p1", "123", "Soda", 250, -1)]);
        let err = plan_adjustments(&current, &[StockAdjustment::new("p1", 1)], AdjustMode::Add)
            .unwrap_err();
        assert!(matches!(err, CoreError::StockConsistency { stock: -1, .. }));
    }

    #[test]
    fn test_assemble_sale_is_consistent() {
        let catalog = by_barcode(vec![
            product("p1", "111", "Water", 199, 10),
            product("p2", "222", "Bread", 333, 10),
        ]);
        let items = price_cart(&[CartLine::new("111", 3), CartLine::new("222", 7)], &catalog)
            .unwrap();

        let mut counter = 0;
        let sale = assemble_sale("s1".to_string(), PaymentMethod::Cash, Utc::now(), &items, || {
            counter += 1;
            format!("i{counter}")
        })
        .unwrap();

        assert_eq!(sale.total_cents, 3 * 199 + 7 * 333);
        assert_eq!(sale.total_items(), 2);
        assert_eq!(sale.items[1].line_no, 1);
        assert_eq!(sale.items[1].id, "i2");
        assert!(sale.is_consistent());
    }
}
