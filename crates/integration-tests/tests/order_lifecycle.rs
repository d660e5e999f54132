//! An order from checkout to delivery and return, seen from both sides.

#![allow(clippy::unwrap_used)]

use serde_json::json;

use zypso_core::SHOP_STATUS_DOCUMENT;
use zypso_core::collections::{ORDERS, PRODUCTS, SHOP_CONTROL};
use zypso_firebase::{DocumentStore, MemoryBackend, Query};
use zypso_integration_tests::{TestContext, fields};

async fn shop() -> TestContext {
    let backend = MemoryBackend::new();
    backend.put(
        PRODUCTS,
        "milk",
        fields(json!({"name": "Milk", "price": 100, "unit": "litre", "category": "Dairy", "status": "Available"})),
    );
    backend.put(
        SHOP_CONTROL,
        SHOP_STATUS_DOCUMENT,
        fields(json!({"isClosed": false, "deliveryCharge": 20})),
    );
    TestContext::start(backend).await
}

async fn only_order_id(backend: &MemoryBackend) -> String {
    let orders = backend.query(ORDERS, &Query::all()).await.unwrap();
    assert_eq!(orders.len(), 1);
    orders.documents.first().unwrap().id.clone()
}

#[tokio::test]
async fn test_delivered_order_counts_towards_revenue() {
    let ctx = shop().await;
    ctx.register("asha@example.com").await;

    let body = ctx.checkout("milk", 2).await;
    assert!(body.contains("Order Placed Successfully!"), "{body}");

    let id = only_order_id(&ctx.backend).await;
    let stored = ctx.backend.get(ORDERS, &id).unwrap();
    assert_eq!(stored["total"], 220);
    assert_eq!(stored["status"], "pending");

    // Pending orders are listed but earn nothing yet.
    let dashboard = ctx.eventually(&format!("{}/", ctx.admin_url), "Asha").await;
    assert!(dashboard.contains("Revenue: ₹0"), "{dashboard}");

    ctx.post(
        &format!("{}/orders/{id}/status", ctx.admin_url),
        &[("status", "delivered")],
    )
    .await;

    let dashboard = ctx
        .eventually(&format!("{}/", ctx.admin_url), "Revenue: ₹220")
        .await;
    assert!(dashboard.contains("Units sold: 2"), "{dashboard}");

    // The customer now sees a Return action instead of Cancel.
    let orders = ctx
        .eventually(&format!("{}/orders", ctx.storefront_url), "delivered")
        .await;
    assert!(orders.contains(&format!("/orders/{id}/return")));
    assert!(!orders.contains(&format!("/orders/{id}/cancel")));
}

#[tokio::test]
async fn test_return_request_removes_revenue() {
    let ctx = shop().await;
    ctx.register("ravi@example.com").await;
    ctx.checkout("milk", 1).await;

    let id = only_order_id(&ctx.backend).await;
    ctx.post(
        &format!("{}/orders/{id}/status", ctx.admin_url),
        &[("status", "delivered")],
    )
    .await;
    ctx.eventually(&format!("{}/orders", ctx.storefront_url), "delivered")
        .await;

    ctx.post(&format!("{}/orders/{id}/return", ctx.storefront_url), &[])
        .await;
    assert_eq!(ctx.backend.get(ORDERS, &id).unwrap()["status"], "return_pending");

    let orders = ctx
        .eventually(&format!("{}/orders", ctx.storefront_url), "return pending")
        .await;
    assert!(!orders.contains(&format!("/orders/{id}/return")));

    ctx.eventually(&format!("{}/", ctx.admin_url), "Revenue: ₹0")
        .await;
}

#[tokio::test]
async fn test_customer_cancels_pending_order() {
    let ctx = shop().await;
    ctx.register("meera@example.com").await;
    ctx.checkout("milk", 1).await;

    let id = only_order_id(&ctx.backend).await;
    let confirm = ctx
        .get(&format!("{}/orders/{id}/cancel", ctx.storefront_url))
        .await;
    assert!(confirm.contains("Yes"));
    assert_eq!(ctx.backend.get(ORDERS, &id).unwrap()["status"], "pending");

    ctx.post(&format!("{}/orders/{id}/cancel", ctx.storefront_url), &[])
        .await;
    assert_eq!(ctx.backend.get(ORDERS, &id).unwrap()["status"], "cancelled");

    let dashboard = ctx
        .eventually(
            &format!("{}/", ctx.admin_url),
            "<option value=\"cancelled\" selected>",
        )
        .await;
    assert!(dashboard.contains("Revenue: ₹0"));
}
