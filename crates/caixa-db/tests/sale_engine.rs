//! Sale commit path: validation, stock decrements and sale records as one unit.

mod common;

use std::time::Duration;

use caixa_core::{CartLine, CoreError, MissingProduct, PaymentMethod, ProductUpdate};
use caixa_db::ServiceError;
use common::*;
use tempfile::TempDir;

#[tokio::test]
async fn test_soda_sale_commits() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;

    let sale = db
        .coordinator(BUDGET)
        .commit_sale(&[CartLine::new("123", 3)], PaymentMethod::Cash)
        .await
        .unwrap();

    assert_eq!(stock_of(&db, &soda.id).await, 2);
    assert_eq!(sale.total_cents, 750);
    assert_eq!(sale.payment_method, PaymentMethod::Cash);
    assert_eq!(sale.total_items(), 1);

    let item = &sale.items[0];
    assert_eq!(item.quantity, 3);
    assert_eq!(item.unit_price_cents, 250);
    assert_eq!(item.subtotal_cents, 750);
    assert_eq!(item.product_name, "Soda");
    assert_eq!(item.barcode, "123");
    assert!(sale.is_consistent());
}

#[tokio::test]
async fn test_insufficient_stock_leaves_stock_untouched() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 2).await;

    let err = db
        .coordinator(BUDGET)
        .commit_sale(&[CartLine::new("123", 5)], PaymentMethod::Cash)
        .await
        .unwrap_err();

    match err {
        ServiceError::Domain(CoreError::InsufficientStock {
            product,
            available,
            requested,
        }) => {
            assert_eq!(product, "Soda");
            assert_eq!(available, 2);
            assert_eq!(requested, 5);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(stock_of(&db, &soda.id).await, 2);
    assert_eq!(sale_rows(&db).await, 0);
}

#[tokio::test]
async fn test_unknown_barcode_changes_nothing() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;
    let water = add_product(&db, "Water", "456", 100, 9).await;

    let lines = [
        CartLine::new("123", 1),
        CartLine::new("456", 2),
        CartLine::new("999", 1),
    ];
    let err = db
        .coordinator(BUDGET)
        .commit_sale(&lines, PaymentMethod::DebitCard)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::ProductNotFound(MissingProduct::Barcode(ref b))) if b == "999"
    ));
    assert_eq!(stock_of(&db, &soda.id).await, 5);
    assert_eq!(stock_of(&db, &water.id).await, 9);
    assert_eq!(sale_rows(&db).await, 0);
    assert_eq!(item_rows(&db).await, 0);
}

#[tokio::test]
async fn test_empty_cart_rejected() {
    let db = memory_db().await;

    let err = db
        .coordinator(BUDGET)
        .commit_sale(&[], PaymentMethod::Cash)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Domain(CoreError::EmptyCart)));
    assert_eq!(sale_rows(&db).await, 0);
}

#[tokio::test]
async fn test_malformed_line_rejected() {
    let db = memory_db().await;
    add_product(&db, "Soda", "123", 250, 5).await;

    let err = db
        .coordinator(BUDGET)
        .commit_sale(&[CartLine::new("123", 0)], PaymentMethod::Cash)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Domain(CoreError::Validation(_))));
}

#[tokio::test]
async fn test_inactive_product_cannot_be_sold() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;
    db.catalog().deactivate(&soda.id).await.unwrap();

    let err = db
        .coordinator(BUDGET)
        .commit_sale(&[CartLine::new("123", 1)], PaymentMethod::Cash)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::ProductNotFound(_))
    ));
    assert_eq!(stock_of(&db, &soda.id).await, 5);
}

#[tokio::test]
async fn test_multi_line_sale_keeps_cart_order() {
    let db = memory_db().await;
    let water = add_product(&db, "Water", "111", 199, 10).await;
    let bread = add_product(&db, "Bread", "222", 333, 10).await;

    let lines = [
        CartLine::new("222", 7),
        CartLine::new("111", 3),
        CartLine::new("222", 1),
    ];
    let sale = db
        .coordinator(BUDGET)
        .commit_sale(&lines, PaymentMethod::InstantTransfer)
        .await
        .unwrap();

    let barcodes: Vec<&str> = sale.items.iter().map(|i| i.barcode.as_str()).collect();
    assert_eq!(barcodes, vec!["222", "111", "222"]);
    assert_eq!(sale.total_cents, 8 * 333 + 3 * 199);
    assert!(sale.is_consistent());

    assert_eq!(stock_of(&db, &water.id).await, 7);
    assert_eq!(stock_of(&db, &bread.id).await, 2);
}

#[tokio::test]
async fn test_repeated_barcode_checked_cumulatively() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;

    let err = db
        .coordinator(BUDGET)
        .commit_sale(
            &[CartLine::new("123", 3), CartLine::new("123", 3)],
            PaymentMethod::Cash,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::InsufficientStock { requested: 6, .. })
    ));
    assert_eq!(stock_of(&db, &soda.id).await, 5);
}

#[tokio::test]
async fn test_recorded_price_and_name_survive_catalogue_changes() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;

    let preview = db
        .validator()
        .preview(&[CartLine::new("123", 2)])
        .await
        .unwrap();
    assert_eq!(preview.total.cents(), 500);

    // Price moves between preview and commit: commit uses its own read.
    db.catalog()
        .update(
            &soda.id,
            ProductUpdate {
                price_cents: Some(300),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap();

    let sale = db
        .coordinator(BUDGET)
        .commit_sale(&[CartLine::new("123", 2)], PaymentMethod::Cash)
        .await
        .unwrap();
    assert_eq!(sale.items[0].unit_price_cents, 300);
    assert_eq!(sale.total_cents, 600);

    // Later catalogue edits never reach the stored sale.
    db.catalog()
        .update(
            &soda.id,
            ProductUpdate {
                name: Some("Soda Zero".to_string()),
                price_cents: Some(999),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap();
    db.catalog().deactivate(&soda.id).await.unwrap();

    let stored = db
        .queries(chrono::FixedOffset::east_opt(0).unwrap())
        .get_sale(&sale.id)
        .await
        .unwrap();
    assert_eq!(stored.items[0].unit_price_cents, 300);
    assert_eq!(stored.items[0].product_name, "Soda");
    assert_eq!(stored, sale);
}

#[tokio::test]
async fn test_preview_does_not_mutate() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;

    let preview = db
        .validator()
        .preview(&[CartLine::new("123", 5)])
        .await
        .unwrap();

    assert_eq!(preview.items.len(), 1);
    assert_eq!(stock_of(&db, &soda.id).await, 5);
    assert_eq!(sale_rows(&db).await, 0);
}

#[tokio::test]
async fn test_failed_sale_insert_restores_decremented_stock() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;
    let water = add_product(&db, "Water", "456", 100, 9).await;

    // Items are written after every decrement has run.
    sqlx::query(
        r#"
        CREATE TRIGGER reject_sale_items BEFORE INSERT ON sale_items
        BEGIN
            SELECT RAISE(ABORT, 'sale items rejected');
        END
        "#,
    )
    .execute(db.pool())
    .await
    .unwrap();

    let lines = [CartLine::new("123", 3), CartLine::new("456", 4)];
    let err = db
        .coordinator(BUDGET)
        .commit_sale(&lines, PaymentMethod::Cash)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Storage(_)), "unexpected error: {err:?}");
    assert_eq!(stock_of(&db, &soda.id).await, 5);
    assert_eq!(stock_of(&db, &water.id).await, 9);
    assert_eq!(sale_rows(&db).await, 0);
    assert_eq!(item_rows(&db).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_commits_never_oversell() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir, 8).await;
    let soda = add_product(&db, "Soda", "123", 250, 10).await;

    let coordinator = db.coordinator(BUDGET);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .commit_sale(&[CartLine::new("123", 3)], PaymentMethod::Cash)
                .await
        }));
    }

    let mut committed = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(ServiceError::Domain(CoreError::InsufficientStock { .. })) => rejected += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(committed, 3);
    assert_eq!(rejected, 5);
    assert_eq!(stock_of(&db, &soda.id).await, 1);
    assert_eq!(sale_rows(&db).await, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_timeout_rolls_back_everything() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir, 4).await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;

    // Another writer holds the lock longer than the sale's budget.
    let blocker = db.begin_immediate().await.unwrap();

    let err = db
        .coordinator(Duration::from_millis(200))
        .commit_sale(&[CartLine::new("123", 1)], PaymentMethod::Cash)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::TransactionTimeout { budget_ms: 200 })
    ));

    // WAL readers see the state from before the attempt.
    assert_eq!(stock_of(&db, &soda.id).await, 5);
    assert_eq!(sale_rows(&db).await, 0);

    blocker.rollback().await.unwrap();
}
