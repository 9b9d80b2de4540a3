//! Stock ledger: add / subtract / set, batch rejection, stock checks.

mod common;

use caixa_core::{AdjustMode, CoreError, MissingProduct, StockAdjustment};
use caixa_db::ServiceError;
use common::*;

#[tokio::test]
async fn test_add_subtract_set() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;
    let ledger = db.ledger();

    let change = ledger.adjust(&soda.id, 4, AdjustMode::Add).await.unwrap();
    assert_eq!((change.previous, change.new_stock), (5, 9));

    let change = ledger.adjust(&soda.id, 6, AdjustMode::Subtract).await.unwrap();
    assert_eq!(change.new_stock, 3);

    let change = ledger.adjust(&soda.id, 40, AdjustMode::Set).await.unwrap();
    assert_eq!(change.new_stock, 40);

    assert_eq!(stock_of(&db, &soda.id).await, 40);
}

#[tokio::test]
async fn test_subtract_below_zero_rejected() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 2).await;

    let err = db
        .ledger()
        .adjust(&soda.id, 3, AdjustMode::Subtract)
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
            assert_eq!(requested, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(stock_of(&db, &soda.id).await, 2);
}

#[tokio::test]
async fn test_negative_set_is_invalid() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 2).await;

    let err = db
        .ledger()
        .adjust(&soda.id, -1, AdjustMode::Set)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::InvalidAdjustment { .. })
    ));
    assert_eq!(stock_of(&db, &soda.id).await, 2);
}

#[tokio::test]
async fn test_unknown_mode_is_invalid() {
    let err = "double".parse::<AdjustMode>().unwrap_err();
    assert!(matches!(err, CoreError::InvalidAdjustment { .. }));
}

#[tokio::test]
async fn test_batch_with_missing_ids_applies_nothing() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;
    let water = add_product(&db, "Water", "456", 100, 5).await;
    db.catalog().deactivate(&water.id).await.unwrap();

    let batch = [
        StockAdjustment::new(soda.id.clone(), 1),
        StockAdjustment::new(water.id.clone(), 1),
        StockAdjustment::new("no-such-id", 1),
    ];
    let err = db
        .ledger()
        .adjust_batch(&batch, AdjustMode::Add)
        .await
        .unwrap_err();

    match err {
        ServiceError::Domain(CoreError::ProductNotFound(MissingProduct::Ids(ids))) => {
            assert_eq!(ids, vec![water.id.clone(), "no-such-id".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(stock_of(&db, &soda.id).await, 5);
    assert_eq!(stock_of(&db, &water.id).await, 5);
}

#[tokio::test]
async fn test_batch_is_all_or_nothing() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;
    let water = add_product(&db, "Water", "456", 100, 1).await;

    let batch = [
        StockAdjustment::new(soda.id.clone(), 2),
        StockAdjustment::new(water.id.clone(), 2),
    ];
    let err = db
        .ledger()
        .adjust_batch(&batch, AdjustMode::Subtract)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::InsufficientStock { .. })
    ));
    assert_eq!(stock_of(&db, &soda.id).await, 5);
    assert_eq!(stock_of(&db, &water.id).await, 1);
}

#[tokio::test]
async fn test_batch_repeated_ids_accumulate() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;

    let batch = [
        StockAdjustment::new(soda.id.clone(), 2),
        StockAdjustment::new(soda.id.clone(), 3),
    ];
    let changes = db
        .ledger()
        .adjust_batch(&batch, AdjustMode::Add)
        .await
        .unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(stock_of(&db, &soda.id).await, 10);
}

#[tokio::test]
async fn test_check_stock() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 7).await;

    let level = db.ledger().check_stock(&soda.id).await.unwrap();
    assert_eq!(level.product_id, soda.id);
    assert_eq!(level.name, "Soda");
    assert_eq!(level.current_stock, 7);

    db.catalog().deactivate(&soda.id).await.unwrap();
    let err = db.ledger().check_stock(&soda.id).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::ProductNotFound(MissingProduct::Ids(_)))
    ));
}

#[tokio::test]
async fn test_check_stock_flags_negative_stock() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 1).await;

    // Simulate a write that bypassed both the ledger and the CHECK constraint.
    let mut conn = db.pool().acquire().await.unwrap();
    sqlx::query("PRAGMA ignore_check_constraints = ON")
        .execute(&mut *conn)
        .await
        .unwrap();
    sqlx::query("UPDATE products SET stock = -4 WHERE id = ?1")
        .bind(&soda.id)
        .execute(&mut *conn)
        .await
        .unwrap();
    sqlx::query("PRAGMA ignore_check_constraints = OFF")
        .execute(&mut *conn)
        .await
        .unwrap();
    drop(conn);

    let err = db.ledger().check_stock(&soda.id).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::StockConsistency { stock: -4, .. })
    ));
}
