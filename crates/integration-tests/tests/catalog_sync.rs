//! Inventory edits in the admin reaching the storefront catalog.

#![allow(clippy::unwrap_used)]

use serde_json::json;

use zypso_core::collections::{CATEGORIES, PRODUCTS};
use zypso_firebase::{DocumentStore, MemoryBackend, Query};
use zypso_integration_tests::{TestContext, fields};

#[tokio::test]
async fn test_added_product_appears_and_can_be_marked_unavailable() {
    let backend = MemoryBackend::new();
    backend.put(CATEGORIES, "bakery", fields(json!({"name": "Bakery"})));
    let ctx = TestContext::start(backend).await;

    ctx.post(
        &format!("{}/inventory/products", ctx.admin_url),
        &[
            ("name", "Croissant"),
            ("price", "55"),
            ("unit", ""),
            ("image_url", ""),
            ("category", "Bakery"),
        ],
    )
    .await;

    let home = ctx
        .eventually(&format!("{}/", ctx.storefront_url), "Croissant")
        .await;
    assert!(home.contains("₹55"));
    assert!(home.contains("Add to cart"));

    let products = ctx.backend.query(PRODUCTS, &Query::all()).await.unwrap();
    let id = products.documents.first().unwrap().id.clone();

    ctx.post(
        &format!("{}/inventory/products/{id}/stock", ctx.admin_url),
        &[("status", "Unavailable")],
    )
    .await;

    let home = ctx
        .eventually(&format!("{}/", ctx.storefront_url), "Unavailable")
        .await;
    assert!(!home.contains("Add to cart"));

    // Adding it anyway leaves the cart empty.
    let cart = ctx
        .post(&format!("{}/cart/add", ctx.storefront_url), &[("product_id", id.as_str())])
        .await;
    assert!(cart.contains("Your cart (0)"), "{cart}");
}

#[tokio::test]
async fn test_deleted_category_disappears_from_chips() {
    let backend = MemoryBackend::new();
    backend.put(CATEGORIES, "snacks", fields(json!({"name": "Snacks"})));
    let ctx = TestContext::start(backend).await;

    ctx.eventually(&format!("{}/", ctx.storefront_url), "Snacks")
        .await;
    ctx.post(
        &format!("{}/inventory/categories/snacks/delete", ctx.admin_url),
        &[],
    )
    .await;

    for _ in 0..100 {
        let home = ctx.get(&format!("{}/", ctx.storefront_url)).await;
        if !home.contains("Snacks") {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("category chip still shown after delete");
}
