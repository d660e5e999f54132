//! Zypso Mart admin library.
//!
//! The dashboard behind the shop: every order with revenue and units sold,
//! the product catalog and categories, and the shop settings document.
//! Exposed as a library so the CLI can reuse the order aggregates and the
//! router can be tested in-process.
//!
//! # Security
//!
//! The dashboard has no login and writes to every collection. Bind it to a
//! private address only.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod inventory;
pub mod orders;
pub mod reports;
pub mod routes;
pub mod settings;
pub mod state;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Directory of stylesheets, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/admin/static";

/// Build the admin router with its middleware stack.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 until orders, products, categories and settings have each
/// delivered a first snapshot.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, Response, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use zypso_core::SHOP_STATUS_DOCUMENT;
    use zypso_core::collections::{CATEGORIES, ORDERS, PRODUCTS, SHOP_CONTROL};
    use zypso_firebase::{DocumentStore, Fields, MemoryBackend, Query};

    use crate::config::AdminConfig;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    /// Two delivered orders on May 1st and 10th (IST), one pending, one
    /// product and one category.
    async fn setup() -> (Router, MemoryBackend) {
        let backend = MemoryBackend::new();
        backend.put(
            ORDERS,
            "o1",
            fields(json!({
                "userId": "u1", "customerName": "Asha", "total": 120, "status": "delivered",
                "createdAt": "2024-05-01T04:30:00Z",
                "items": [{"id": "milk", "name": "Milk", "price": 50, "unit": "litre", "qty": 2}],
            })),
        );
        backend.put(
            ORDERS,
            "o2",
            fields(json!({
                "userId": "u2", "customerName": "Ravi", "total": 300, "status": "delivered",
                "createdAt": "2024-05-10T04:30:00Z",
                "items": [{"id": "ghee", "name": "Ghee", "price": 300, "qty": 1}],
            })),
        );
        backend.put(
            ORDERS,
            "o3",
            fields(json!({
                "userId": "u1", "customerName": "Asha", "total": 40, "status": "pending",
                "createdAt": "2024-05-01T05:00:00Z",
                "items": [{"id": "bread", "name": "Bread", "price": 40, "qty": 1}],
            })),
        );
        backend.put(
            PRODUCTS,
            "milk",
            fields(json!({"name": "Milk", "price": 50, "unit": "litre", "category": "Dairy", "status": "Available"})),
        );
        backend.put(CATEGORIES, "dairy", fields(json!({"name": "Dairy"})));

        let state = AppState::new(AdminConfig::memory(), std::sync::Arc::new(backend.clone()));
        state.orders().wait_for(|o| o.len() == 3).await.unwrap();
        state.products().wait_for(|p| p.len() == 1).await.unwrap();
        state.categories().wait_for(|c| c.len() == 1).await.unwrap();
        for _ in 0..50 {
            if state.is_ready() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        (app(state), backend)
    }

    async fn get(app: &Router, uri: &str) -> Response<Body> {
        app.clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post(app: &Router, uri: &str, form: &str) -> Response<Body> {
        app.clone()
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(form.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response<Body>) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_and_readiness() {
        let (app, _) = setup().await;
        assert_eq!(text(get(&app, "/health").await).await, "ok");
        // Settings document does not exist yet, but its mirror has loaded.
        assert_eq!(get(&app, "/health/ready").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_revenue_counts_delivered_orders_only() {
        let (app, _) = setup().await;
        let body = text(get(&app, "/").await).await;
        assert!(body.contains("Revenue: ₹420"), "{body}");
        assert!(body.contains("Units sold: 3"), "{body}");
        assert!(body.contains("Milk (x2)"));
    }

    #[tokio::test]
    async fn test_date_filter_narrows_the_table() {
        let (app, _) = setup().await;
        let body = text(get(&app, "/orders/table?start=2024-05-01&end=2024-05-01").await).await;
        assert!(body.contains("Revenue: ₹120"), "{body}");
        assert!(body.contains("Units sold: 2"));
        assert!(!body.contains("Ravi"));
        assert!(body.contains("2024-05-01&amp;end=2024-05-01"), "{body}");
    }

    #[tokio::test]
    async fn test_status_change_is_written() {
        let (app, backend) = setup().await;
        let response = post(&app, "/orders/o3/status", "status=delivered").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(backend.get(ORDERS, "o3").unwrap()["status"], "delivered");

        let response = post(&app, "/orders/o3/status", "status=shipped").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_add_product_validation_and_success() {
        let (app, backend) = setup().await;

        let response = post(&app, "/inventory/products", "name=Eggs&price=abc&unit=&image_url=&category=Dairy").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = text(response).await;
        assert!(body.contains("Product name and a price are required"));
        assert!(body.contains("value=\"Eggs\""));

        let response = post(&app, "/inventory/products", "name=Eggs&price=72&unit=&image_url=&category=Dairy").await;
        assert_eq!(location(&response), "/inventory?success=product_added");

        let products = backend
            .query(PRODUCTS, &Query::all())
            .await
            .unwrap();
        let eggs = products
            .documents
            .iter()
            .find(|d| d.data["name"] == "Eggs")
            .unwrap();
        assert_eq!(eggs.data["unit"], "piece");
        assert_eq!(eggs.data["status"], "Available");
    }

    #[tokio::test]
    async fn test_edit_rejects_non_numeric_price() {
        let (app, backend) = setup().await;
        let body = text(get(&app, "/inventory/products/milk/edit").await).await;
        assert!(body.contains("value=\"50\""));

        let body = text(post(&app, "/inventory/products/milk", "name=Milk&price=abc&unit=litre&image_url=").await).await;
        assert!(body.contains("Price must be a whole number"));
        assert_eq!(backend.get(PRODUCTS, "milk").unwrap()["price"], 50);

        let response = post(&app, "/inventory/products/milk", "name=Milk&price=55&unit=&image_url=").await;
        assert_eq!(location(&response), "/inventory?success=product_updated");
        let stored = backend.get(PRODUCTS, "milk").unwrap();
        assert_eq!(stored["price"], 55);
        assert_eq!(stored["unit"], "piece");
    }

    #[tokio::test]
    async fn test_stock_toggle_and_confirmed_delete() {
        let (app, backend) = setup().await;
        post(&app, "/inventory/products/milk/stock", "status=Unavailable").await;
        assert_eq!(backend.get(PRODUCTS, "milk").unwrap()["status"], "Unavailable");

        let body = text(get(&app, "/inventory/products/milk/delete").await).await;
        assert!(body.contains("Delete Product?"));
        assert!(backend.get(PRODUCTS, "milk").is_some());

        post(&app, "/inventory/products/milk/delete", "").await;
        assert!(backend.get(PRODUCTS, "milk").is_none());
    }

    #[tokio::test]
    async fn test_categories() {
        let (app, backend) = setup().await;
        let response = post(&app, "/inventory/categories", "name=+++").await;
        assert_eq!(location(&response), "/inventory?error=category_name");

        let body = text(get(&app, "/inventory/categories/dairy/delete").await).await;
        assert!(body.contains("Delete Category?"));

        post(&app, "/inventory/categories/dairy/delete", "").await;
        assert!(backend.get(CATEGORIES, "dairy").is_none());
    }

    #[tokio::test]
    async fn test_settings_form_round_trip() {
        let (app, backend) = setup().await;
        let body = text(get(&app, "/settings").await).await;
        assert!(body.contains("8090315246"));

        let body = text(post(&app, "/settings", "is_closed=on&delivery_charge=oops&support_number=12345").await).await;
        assert!(body.contains("Settings Saved Successfully"));

        let stored = backend.get(SHOP_CONTROL, SHOP_STATUS_DOCUMENT).unwrap();
        assert_eq!(stored["isClosed"], true);
        assert_eq!(stored["deliveryCharge"], 0);
        assert_eq!(stored["supportNumber"], "12345");
    }
}
