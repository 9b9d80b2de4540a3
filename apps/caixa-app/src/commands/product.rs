//! # Product Commands
//!
//! Catalogue CRUD. Stock is set once at creation; afterwards it moves only
//! through the stock commands.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::DbState;
use caixa_core::{Category, NewProduct, Product, ProductUpdate};

/// Product DTO for callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub barcode: String,
    pub name: String,
    pub price_cents: i64,
    /// Formatted price, e.g. "$2.50".
    pub price: String,
    pub stock: i64,
    pub category: Category,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            price: p.price().to_string(),
            id: p.id,
            barcode: p.barcode,
            name: p.name,
            price_cents: p.price_cents,
            stock: p.stock,
            category: p.category,
            is_active: p.is_active,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub barcode: String,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    pub category: String,
}

/// Fields left out are unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub barcode: Option<String>,
    pub price_cents: Option<i64>,
    pub category: Option<String>,
}

fn parse_category(raw: &str) -> Result<Category, ApiError> {
    Ok(raw.parse::<Category>()?)
}

/// Registers a product.
pub async fn create_product(
    db: &DbState,
    request: CreateProductRequest,
) -> Result<ProductDto, ApiError> {
    debug!(barcode = %request.barcode, "create_product command");
    let new = NewProduct {
        name: request.name,
        barcode: request.barcode,
        price_cents: request.price_cents,
        stock: request.stock,
        category: parse_category(&request.category)?,
    };
    let product = db.inner().catalog().create(new).await?;
    Ok(ProductDto::from(product))
}

/// Active products, by name.
pub async fn list_products(db: &DbState) -> Result<Vec<ProductDto>, ApiError> {
    debug!("list_products command");
    let products = db.inner().catalog().list().await?;
    Ok(products.into_iter().map(ProductDto::from).collect())
}

pub async fn get_product(db: &DbState, id: String) -> Result<ProductDto, ApiError> {
    debug!(id = %id, "get_product command");
    Ok(db.inner().catalog().get(&id).await?.into())
}

pub async fn get_product_by_barcode(
    db: &DbState,
    barcode: String,
) -> Result<ProductDto, ApiError> {
    debug!(barcode = %barcode, "get_product_by_barcode command");
    Ok(db.inner().catalog().get_by_barcode(&barcode).await?.into())
}

/// Searches active products by category and/or name fragment.
///
/// An empty result is `NOT_FOUND`.
pub async fn search_products(
    db: &DbState,
    category: Option<String>,
    name: Option<String>,
) -> Result<Vec<ProductDto>, ApiError> {
    debug!(?category, ?name, "search_products command");
    let category = category.as_deref().map(parse_category).transpose()?;
    let products = db
        .inner()
        .catalog()
        .search(category, name.as_deref())
        .await?;
    Ok(products.into_iter().map(ProductDto::from).collect())
}

pub async fn update_product(
    db: &DbState,
    id: String,
    request: UpdateProductRequest,
) -> Result<ProductDto, ApiError> {
    debug!(id = %id, "update_product command");
    let changes = ProductUpdate {
        name: request.name,
        barcode: request.barcode,
        price_cents: request.price_cents,
        category: request.category.as_deref().map(parse_category).transpose()?,
    };
    Ok(db.inner().catalog().update(&id, changes).await?.into())
}

/// Soft delete.
pub async fn deactivate_product(db: &DbState, id: String) -> Result<(), ApiError> {
    debug!(id = %id, "deactivate_product command");
    db.inner().catalog().deactivate(&id).await?;
    Ok(())
}

pub async fn activate_product(db: &DbState, id: String) -> Result<ProductDto, ApiError> {
    debug!(id = %id, "activate_product command");
    Ok(db.inner().catalog().activate(&id).await?.into())
}
