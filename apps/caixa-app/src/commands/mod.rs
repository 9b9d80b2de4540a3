//! # Commands Module
//!
//! All commands exposed to callers.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (dispatch)
//! ├── product.rs  ◄─── Catalogue CRUD and search
//! ├── stock.rs    ◄─── Ledger adjustments and stock checks
//! └── sale.rs     ◄─── Preview, commit, listing, receipts
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  {"command": "commit_sale",                                            │
//! │   "args": {"lines": [{"barcode": "123", "quantity": 3}],               │
//! │            "paymentMethod": "CASH"}}                                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  dispatch() ── deserializes args (camelCase)                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  sale::commit_sale(db, lines, payment_method)                          │
//! │      -> Result<SaleDto, ApiError>                                       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  {"ok": true, "data": {...}}  or  {"ok": false, "error": {...}}        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each command takes only the state it needs.

pub mod product;
pub mod sale;
pub mod stock;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};

/// One call: command name plus its arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub args: Value,
}

/// Reply envelope written back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl From<Result<Value, ApiError>> for CommandResponse {
    fn from(result: Result<Value, ApiError>) -> Self {
        match result {
            Ok(data) => CommandResponse {
                ok: true,
                data: Some(data),
                error: None,
            },
            Err(error) => CommandResponse {
                ok: false,
                data: None,
                error: Some(error),
            },
        }
    }
}

// =============================================================================
// Argument Shapes
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdArgs {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BarcodeArgs {
    barcode: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchArgs {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateArgs {
    id: String,
    #[serde(flatten)]
    changes: product::UpdateProductRequest,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdjustArgs {
    product_id: String,
    quantity: i64,
    mode: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdjustBatchArgs {
    adjustments: Vec<stock::AdjustmentDto>,
    mode: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductIdArgs {
    product_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartArgs {
    lines: Vec<sale::CartLineDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitArgs {
    lines: Vec<sale::CartLineDto>,
    payment_method: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaleIdArgs {
    sale_id: String,
}

fn args<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    // Absent args behave like an empty object.
    let value = if value.is_null() {
        Value::Object(Default::default())
    } else {
        value
    };
    serde_json::from_value(value).map_err(|e| ApiError::validation(format!("Invalid arguments: {}", e)))
}

fn reply<T: Serialize>(data: T) -> Result<Value, ApiError> {
    serde_json::to_value(data).map_err(|e| {
        tracing::error!("Failed to serialize response: {}", e);
        ApiError::internal("Failed to serialize response")
    })
}

/// Routes a request to its command.
pub async fn dispatch(
    db: &DbState,
    config: &ConfigState,
    request: CommandRequest,
) -> Result<Value, ApiError> {
    let CommandRequest { command, args: raw } = request;

    match command.as_str() {
        // Product commands
        "create_product" => reply(product::create_product(db, args(raw)?).await?),
        "list_products" => reply(product::list_products(db).await?),
        "get_product" => {
            let IdArgs { id } = args(raw)?;
            reply(product::get_product(db, id).await?)
        }
        "get_product_by_barcode" => {
            let BarcodeArgs { barcode } = args(raw)?;
            reply(product::get_product_by_barcode(db, barcode).await?)
        }
        "search_products" => {
            let SearchArgs { category, name } = args(raw)?;
            reply(product::search_products(db, category, name).await?)
        }
        "update_product" => {
            let UpdateArgs { id, changes } = args(raw)?;
            reply(product::update_product(db, id, changes).await?)
        }
        "deactivate_product" => {
            let IdArgs { id } = args(raw)?;
            reply(product::deactivate_product(db, id).await?)
        }
        "activate_product" => {
            let IdArgs { id } = args(raw)?;
            reply(product::activate_product(db, id).await?)
        }
        // Stock commands
        "adjust_stock" => {
            let AdjustArgs {
                product_id,
                quantity,
                mode,
            } = args(raw)?;
            reply(stock::adjust_stock(db, product_id, quantity, mode).await?)
        }
        "adjust_stock_batch" => {
            let AdjustBatchArgs { adjustments, mode } = args(raw)?;
            reply(stock::adjust_stock_batch(db, adjustments, mode).await?)
        }
        "check_stock" => {
            let ProductIdArgs { product_id } = args(raw)?;
            reply(stock::check_stock(db, product_id).await?)
        }
        // Sale commands
        "preview_cart" => {
            let CartArgs { lines } = args(raw)?;
            reply(sale::preview_cart(db, lines).await?)
        }
        "commit_sale" => {
            let CommitArgs {
                lines,
                payment_method,
            } = args(raw)?;
            reply(sale::commit_sale(db, lines, payment_method).await?)
        }
        "list_sales" => reply(sale::list_sales(db, args(raw)?).await?),
        "get_sale" => {
            let IdArgs { id } = args(raw)?;
            reply(sale::get_sale(db, id).await?)
        }
        "get_receipt" => {
            let SaleIdArgs { sale_id } = args(raw)?;
            reply(sale::get_receipt(db, config, sale_id).await?)
        }
        other => Err(ApiError::validation(format!("Unknown command: {}", other))),
    }
}
