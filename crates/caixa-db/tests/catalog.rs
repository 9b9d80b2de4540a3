//! Product catalogue rules.

mod common;

use caixa_core::{Category, CoreError, MissingProduct, NewProduct, ProductUpdate};
use caixa_db::ServiceError;
use common::*;

fn new_product(name: &str, barcode: &str, category: Category) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        barcode: barcode.to_string(),
        price_cents: 450,
        stock: 12,
        category,
    }
}

#[tokio::test]
async fn test_create_and_get() {
    let db = memory_db().await;
    let catalog = db.catalog();

    let created = catalog
        .create(new_product("  Orange Juice ", " 7891000 ", Category::Beverages))
        .await
        .unwrap();

    assert_eq!(created.name, "Orange Juice");
    assert_eq!(created.barcode, "7891000");
    assert!(created.is_active);

    let by_id = catalog.get(&created.id).await.unwrap();
    assert_eq!(by_id, created);

    let by_barcode = catalog.get_by_barcode("7891000").await.unwrap();
    assert_eq!(by_barcode.id, created.id);
}

#[tokio::test]
async fn test_create_rejects_invalid_fields() {
    let db = memory_db().await;

    let mut bad = new_product("Soap", "555", Category::Hygiene);
    bad.price_cents = -1;
    let err = db.catalog().create(bad).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(CoreError::Validation(_))));

    let err = db
        .catalog()
        .create(new_product("", "556", Category::Hygiene))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(CoreError::Validation(_))));
}

#[tokio::test]
async fn test_duplicate_barcode_rejected() {
    let db = memory_db().await;
    let catalog = db.catalog();

    let first = catalog
        .create(new_product("Soap", "555", Category::Hygiene))
        .await
        .unwrap();

    let err = catalog
        .create(new_product("Other Soap", "555", Category::Hygiene))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::DuplicateBarcode(ref b)) if b == "555"
    ));

    // Inactive products still own their barcode.
    catalog.deactivate(&first.id).await.unwrap();
    let err = catalog
        .create(new_product("Other Soap", "555", Category::Hygiene))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::DuplicateBarcode(_))
    ));
}

#[tokio::test]
async fn test_search_by_name_and_category() {
    let db = memory_db().await;
    let catalog = db.catalog();

    catalog
        .create(new_product("Lemon Soda", "1", Category::Beverages))
        .await
        .unwrap();
    catalog
        .create(new_product("Orange Soda", "2", Category::Beverages))
        .await
        .unwrap();
    catalog
        .create(new_product("Soda Crackers", "3", Category::Food))
        .await
        .unwrap();
    catalog
        .create(new_product("Bleach", "4", Category::Cleaning))
        .await
        .unwrap();

    let hits = catalog.search(None, Some("SODA")).await.unwrap();
    assert_eq!(hits.len(), 3);

    let hits = catalog
        .search(Some(Category::Beverages), Some("soda"))
        .await
        .unwrap();
    let names: Vec<&str> = hits.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Lemon Soda", "Orange Soda"]);

    let hits = catalog.search(Some(Category::Cleaning), None).await.unwrap();
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let db = memory_db().await;
    let catalog = db.catalog();

    catalog
        .create(new_product("Cleaner 100%", "1", Category::Cleaning))
        .await
        .unwrap();
    catalog
        .create(new_product("Cleaner 1000", "2", Category::Cleaning))
        .await
        .unwrap();

    let hits = catalog.search(None, Some("100%")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Cleaner 100%");
}

#[tokio::test]
async fn test_search_without_results_is_not_found() {
    let db = memory_db().await;
    add_product(&db, "Soda", "123", 250, 5).await;

    let err = db
        .catalog()
        .search(Some(Category::Hygiene), Some("soda"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::ProductNotFound(MissingProduct::Search(_)))
    ));
}

#[tokio::test]
async fn test_search_skips_inactive() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;
    db.catalog().deactivate(&soda.id).await.unwrap();

    let err = db.catalog().search(None, Some("soda")).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::ProductNotFound(_))
    ));
}

#[tokio::test]
async fn test_update_fields() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;

    let updated = db
        .catalog()
        .update(
            &soda.id,
            ProductUpdate {
                name: Some("Diet Soda".to_string()),
                barcode: Some("124".to_string()),
                price_cents: Some(275),
                category: Some(Category::Other),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Diet Soda");
    assert_eq!(updated.barcode, "124");
    assert_eq!(updated.price_cents, 275);
    assert_eq!(updated.category, Category::Other);
    // Stock never moves through the catalogue.
    assert_eq!(updated.stock, 5);

    let stored = db.catalog().get(&soda.id).await.unwrap();
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn test_update_rejects_taken_barcode() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;
    add_product(&db, "Water", "456", 100, 5).await;

    let err = db
        .catalog()
        .update(
            &soda.id,
            ProductUpdate {
                barcode: Some("456".to_string()),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::DuplicateBarcode(_))
    ));

    // Keeping its own barcode is fine.
    db.catalog()
        .update(
            &soda.id,
            ProductUpdate {
                barcode: Some("123".to_string()),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_unknown_product() {
    let db = memory_db().await;

    let err = db
        .catalog()
        .update("missing", ProductUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::ProductNotFound(_))
    ));
}

#[tokio::test]
async fn test_deactivate_and_activate() {
    let db = memory_db().await;
    let soda = add_product(&db, "Soda", "123", 250, 5).await;
    let catalog = db.catalog();

    catalog.deactivate(&soda.id).await.unwrap();
    assert!(catalog.get(&soda.id).await.is_err());
    assert!(catalog.list().await.unwrap().is_empty());

    // Deactivating twice reports the product as missing.
    let err = catalog.deactivate(&soda.id).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::ProductNotFound(_))
    ));

    let restored = catalog.activate(&soda.id).await.unwrap();
    assert!(restored.is_active);
    assert_eq!(catalog.list().await.unwrap().len(), 1);
    assert_eq!(stock_of(&db, &soda.id).await, 5);
}
