//! Command surface: DTO shapes and error codes seen by callers.

use std::time::Duration;

use caixa_app::commands::product::{self, CreateProductRequest, ProductDto};
use caixa_app::commands::sale::{self, CartLineDto, ListSalesRequest};
use caixa_app::commands::stock::{self, AdjustmentDto};
use caixa_app::commands::{dispatch, CommandRequest, CommandResponse};
use caixa_app::config::StoreInfo;
use caixa_app::error::ErrorCode;
use caixa_app::state::{ConfigState, DbState};
use caixa_db::{Database, DbConfig};
use chrono::FixedOffset;
use serde_json::json;

async fn state() -> (DbState, ConfigState) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let db = DbState::new(
        db,
        Duration::from_secs(10),
        FixedOffset::east_opt(0).unwrap(),
    );
    let store = ConfigState::new(StoreInfo {
        name: "Mercado Central".to_string(),
        tax_id: Some("12.345.678/0001-90".to_string()),
        address: Some("Rua das Flores, 100".to_string()),
        city: Some("Curitiba".to_string()),
    });
    (db, store)
}

async fn soda(db: &DbState, stock: i64) -> ProductDto {
    product::create_product(
        db,
        CreateProductRequest {
            name: "Soda".to_string(),
            barcode: "123".to_string(),
            price_cents: 250,
            stock,
            category: "beverages".to_string(),
        },
    )
    .await
    .unwrap()
}

fn line(barcode: &str, quantity: i64) -> CartLineDto {
    CartLineDto {
        barcode: barcode.to_string(),
        quantity,
    }
}

#[tokio::test]
async fn test_commit_and_receipt() {
    let (db, store) = state().await;
    let product = soda(&db, 5).await;
    assert_eq!(product.price, "$2.50");

    let sale = sale::commit_sale(&db, vec![line("123", 3)], "CASH".to_string())
        .await
        .unwrap();
    assert_eq!(sale.total_cents, 750);
    assert_eq!(sale.total, "$7.50");
    assert_eq!(sale.total_items, 1);

    let level = stock::check_stock(&db, product.id.clone()).await.unwrap();
    assert_eq!(level.current_stock, 2);

    let receipt = sale::get_receipt(&db, &store, sale.id.clone()).await.unwrap();
    assert_eq!(receipt.store.name, "Mercado Central");
    assert_eq!(receipt.sale_id, sale.id);
    assert_eq!(receipt.lines[0].name, "Soda");
    assert_eq!(receipt.lines[0].quantity, 3);
    assert_eq!(receipt.total, "$7.50");
}

#[tokio::test]
async fn test_domain_errors_map_to_codes() {
    let (db, _) = state().await;
    soda(&db, 2).await;

    let err = sale::commit_sale(&db, vec![line("123", 5)], "CASH".to_string())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientStock);
    assert!(err.message.contains("Soda"));

    let err = sale::commit_sale(&db, vec![line("999", 1)], "CASH".to_string())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
    assert!(err.message.contains("999"));

    let err = sale::commit_sale(&db, vec![], "CASH".to_string())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::EmptyCart);

    let err = sale::commit_sale(&db, vec![line("123", 1)], "BARTER".to_string())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let err = sale::get_sale(&db, "nope".to_string()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_stock_commands() {
    let (db, _) = state().await;
    let product = soda(&db, 5).await;

    let change = stock::adjust_stock(&db, product.id.clone(), 10, "add".to_string())
        .await
        .unwrap();
    assert_eq!(change.previous_stock, 5);
    assert_eq!(change.new_stock, 15);

    let err = stock::adjust_stock(&db, product.id.clone(), 1, "double".to_string())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidAdjustment);

    let err = stock::adjust_stock(&db, product.id.clone(), -1, "set".to_string())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidAdjustment);

    let err = stock::adjust_stock_batch(
        &db,
        vec![
            AdjustmentDto {
                product_id: product.id.clone(),
                quantity: 1,
            },
            AdjustmentDto {
                product_id: "ghost".to_string(),
                quantity: 1,
            },
        ],
        "subtract".to_string(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
    assert!(err.message.contains("ghost"));

    let level = stock::check_stock(&db, product.id).await.unwrap();
    assert_eq!(level.current_stock, 15);
}

#[tokio::test]
async fn test_product_commands() {
    let (db, _) = state().await;
    let product = soda(&db, 5).await;

    let err = product::create_product(
        &db,
        CreateProductRequest {
            name: "Other".to_string(),
            barcode: "123".to_string(),
            price_cents: 100,
            stock: 0,
            category: "FOOD".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);

    let err = product::search_products(&db, Some("TOYS".to_string()), None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let hits = product::search_products(
        &db,
        Some("BEVERAGES".to_string()),
        Some("so".to_string()),
    )
    .await
    .unwrap();
    assert_eq!(hits.len(), 1);

    let err = product::search_products(&db, None, Some("bread".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    product::deactivate_product(&db, product.id.clone())
        .await
        .unwrap();
    let err = product::get_product(&db, product.id.clone())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    let restored = product::activate_product(&db, product.id).await.unwrap();
    assert!(restored.is_active);
}

#[tokio::test]
async fn test_list_sales_command() {
    let (db, _) = state().await;
    soda(&db, 50).await;

    for method in ["CASH", "DEBIT_CARD", "CASH"] {
        sale::commit_sale(&db, vec![line("123", 1)], method.to_string())
            .await
            .unwrap();
    }

    let page = sale::list_sales(
        &db,
        ListSalesRequest {
            payment_method: Some("CASH".to_string()),
            ..ListSalesRequest::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.total_revenue_cents, 500);

    let err = sale::list_sales(
        &db,
        ListSalesRequest {
            limit: Some(500),
            ..ListSalesRequest::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_dispatch_round_trip() {
    let (db, store) = state().await;

    let request: CommandRequest = serde_json::from_value(json!({
        "command": "create_product",
        "args": {
            "name": "Soda",
            "barcode": "123",
            "priceCents": 250,
            "stock": 5,
            "category": "BEVERAGES"
        }
    }))
    .unwrap();
    let created = dispatch(&db, &store, request).await.unwrap();
    assert_eq!(created["barcode"], "123");

    let request: CommandRequest = serde_json::from_value(json!({
        "command": "commit_sale",
        "args": {
            "lines": [{"barcode": "123", "quantity": 2}],
            "paymentMethod": "INSTANT_TRANSFER"
        }
    }))
    .unwrap();
    let sale = dispatch(&db, &store, request).await.unwrap();
    assert_eq!(sale["totalCents"], 500);
    assert_eq!(sale["paymentMethod"], "INSTANT_TRANSFER");

    let request: CommandRequest =
        serde_json::from_value(json!({"command": "refund_sale"})).unwrap();
    let response = CommandResponse::from(dispatch(&db, &store, request).await);
    let response = serde_json::to_value(&response).unwrap();
    assert_eq!(response["ok"], false);
    assert_eq!(response["error"]["code"], "VALIDATION_ERROR");

    let request: CommandRequest = serde_json::from_value(json!({
        "command": "get_sale",
        "args": {}
    }))
    .unwrap();
    let err = dispatch(&db, &store, request).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}
