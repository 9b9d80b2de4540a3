//! # Product Catalogue
//!
//! Product CRUD with business rules on top of [`ProductRepository`].
//!
//! Stock is set once at creation; afterwards it only moves through the
//! [`StockLedger`](crate::ledger::StockLedger).

use caixa_core::validation::{validate_new_product, validate_product_update};
use caixa_core::{Category, CoreError, MissingProduct, NewProduct, Product, ProductUpdate};
use chrono::{SubsecRound, Utc};
use tracing::{debug, info};

use crate::error::{DbError, ServiceError, ServiceResult};
use crate::pool::Database;
use crate::repository::product::{generate_product_id, ProductRepository};

/// Catalogue operations.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: ProductRepository,
}

impl Catalog {
    pub fn new(db: Database) -> Self {
        Catalog {
            products: db.products(),
        }
    }

    /// Registers a product.
    ///
    /// ## Errors
    /// - `Validation` - bad field
    /// - `DuplicateBarcode` - barcode already used (active or not)
    pub async fn create(&self, new: NewProduct) -> ServiceResult<Product> {
        validate_new_product(&new)?;

        let barcode = new.barcode.trim().to_string();
        if self.products.get_by_barcode(&barcode).await?.is_some() {
            return Err(CoreError::DuplicateBarcode(barcode).into());
        }

        let now = Utc::now().trunc_subsecs(3);
        let product = Product {
            id: generate_product_id(),
            barcode: barcode.clone(),
            name: new.name.trim().to_string(),
            price_cents: new.price_cents,
            stock: new.stock,
            category: new.category,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let product = self
            .products
            .insert(&product)
            .await
            .map_err(|err| duplicate_or(err, &barcode))?;

        info!(id = %product.id, barcode = %product.barcode, "Product created");
        Ok(product)
    }

    /// All active products, by name.
    pub async fn list(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.products.list_active().await?)
    }

    /// An active product by id.
    pub async fn get(&self, id: &str) -> ServiceResult<Product> {
        self.products
            .get_active_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ids_not_found([id]).into())
    }

    /// An active product by barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> ServiceResult<Product> {
        let barcode = barcode.trim();
        self.products
            .get_active_by_barcode(barcode)
            .await?
            .ok_or_else(|| CoreError::barcode_not_found(barcode).into())
    }

    /// Active products filtered by category and name fragment.
    ///
    /// An empty result is `ProductNotFound`.
    pub async fn search(
        &self,
        category: Option<Category>,
        name: Option<&str>,
    ) -> ServiceResult<Vec<Product>> {
        let found = self.products.search(category, name).await?;
        if found.is_empty() {
            let criteria = describe_search(category, name);
            debug!(%criteria, "Search matched nothing");
            return Err(CoreError::ProductNotFound(MissingProduct::Search(criteria)).into());
        }
        Ok(found)
    }

    /// Changes name, barcode, price or category.
    ///
    /// ## Errors
    /// - `ProductNotFound` - unknown id
    /// - `DuplicateBarcode` - new barcode belongs to another product
    pub async fn update(&self, id: &str, changes: ProductUpdate) -> ServiceResult<Product> {
        validate_product_update(&changes)?;

        let mut product = self
            .products
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ids_not_found([id]))?;

        if let Some(barcode) = changes.barcode.as_deref().map(str::trim) {
            if barcode != product.barcode {
                if let Some(other) = self.products.get_by_barcode(barcode).await? {
                    if other.id != product.id {
                        return Err(CoreError::DuplicateBarcode(barcode.to_string()).into());
                    }
                }
            }
        }

        changes.apply_to(&mut product);
        product.updated_at = Utc::now().trunc_subsecs(3);

        let updated = self
            .products
            .update_details(&product)
            .await
            .map_err(|err| duplicate_or(err, &product.barcode))?;
        if !updated {
            return Err(CoreError::ids_not_found([id]).into());
        }

        info!(id = %product.id, "Product updated");
        Ok(product)
    }

    /// Soft-deletes an active product.
    pub async fn deactivate(&self, id: &str) -> ServiceResult<()> {
        let product = self.get(id).await?;
        self.products
            .set_active(&product.id, false, Utc::now().trunc_subsecs(3))
            .await?;
        info!(id = %product.id, "Product deactivated");
        Ok(())
    }

    /// Restores a soft-deleted product.
    pub async fn activate(&self, id: &str) -> ServiceResult<Product> {
        let mut product = self
            .products
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ids_not_found([id]))?;

        let now = Utc::now().trunc_subsecs(3);
        self.products.set_active(&product.id, true, now).await?;
        product.is_active = true;
        product.updated_at = now;

        info!(id = %product.id, "Product activated");
        Ok(product)
    }
}

/// A UNIQUE race on barcode becomes `DuplicateBarcode`; anything else stays storage.
fn duplicate_or(err: DbError, barcode: &str) -> ServiceError {
    match err {
        DbError::UniqueViolation { ref field, .. } if field.contains("barcode") => {
            CoreError::DuplicateBarcode(barcode.to_string()).into()
        }
        other => other.into(),
    }
}

fn describe_search(category: Option<Category>, name: Option<&str>) -> String {
    match (category, name.map(str::trim).filter(|n| !n.is_empty())) {
        (Some(c), Some(n)) => format!("category {} and name '{}'", c, n),
        (Some(c), None) => format!("category {}", c),
        (None, Some(n)) => format!("name '{}'", n),
        (None, None) => "an empty catalogue".to_string(),
    }
}
