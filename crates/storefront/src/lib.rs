//! Zypso Mart storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod orders;
pub mod routes;
pub mod services;
pub mod settings;
pub mod state;

use axum::{Router, extract::State, http::StatusCode, middleware::from_fn, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Directory of stylesheets and images, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the storefront router with its full middleware stack.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
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
/// Returns 503 until the catalog, the categories and the shop settings
/// have each delivered a first snapshot.
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

    use zypso_core::Price;
    use zypso_core::collections::{ORDERS, PRODUCTS, SHOP_CONTROL};
    use zypso_core::SHOP_STATUS_DOCUMENT;
    use zypso_firebase::{Backend, DocumentStore, Fields, MemoryBackend, Query};

    use crate::config::StorefrontConfig;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    /// A memory-backed app with two products and a ₹20 delivery charge.
    async fn setup() -> (Router, MemoryBackend) {
        let backend = MemoryBackend::new();
        backend.put(
            PRODUCTS,
            "milk",
            fields(json!({"name": "Milk", "price": 100, "unit": "litre", "category": "Dairy", "status": "Available"})),
        );
        backend.put(
            PRODUCTS,
            "ghee",
            fields(json!({"name": "Ghee", "price": 500, "category": "Dairy", "status": "Unavailable"})),
        );
        backend.put(
            SHOP_CONTROL,
            SHOP_STATUS_DOCUMENT,
            fields(json!({"isClosed": false, "deliveryCharge": 20})),
        );

        let state = AppState::new(StorefrontConfig::memory(), Backend::memory(backend.clone()));
        state.products().wait_for(|p| p.len() == 2).await.unwrap();
        state.categories().wait_for(|_| true).await.unwrap();
        state
            .settings_mirror()
            .wait_for(|s| s.delivery_charge == Price::new(20))
            .await
            .unwrap();

        (app(state), backend)
    }

    /// A client that keeps the session cookie between requests.
    struct Client {
        app: Router,
        cookie: Option<String>,
    }

    impl Client {
        fn new(app: Router) -> Self {
            Self { app, cookie: None }
        }

        async fn send(&mut self, builder: axum::http::request::Builder, body: Body) -> Response<Body> {
            let builder = match &self.cookie {
                Some(cookie) => builder.header(header::COOKIE, cookie),
                None => builder,
            };
            let response = self
                .app
                .clone()
                .oneshot(
                    builder
                        .header("x-forwarded-for", "203.0.113.7")
                        .body(body)
                        .unwrap(),
                )
                .await
                .unwrap();

            if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
                let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
                self.cookie = Some(pair.to_string());
            }
            response
        }

        async fn get(&mut self, uri: &str) -> Response<Body> {
            self.send(Request::get(uri), Body::empty()).await
        }

        async fn post(&mut self, uri: &str, form: &str, htmx: bool) -> Response<Body> {
            let mut builder = Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
            if htmx {
                builder = builder.header("hx-request", "true");
            }
            self.send(builder, Body::from(form.to_string())).await
        }
    }

    async fn text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// Fetch `uri` until the live projections catch up with `needle`.
    async fn eventually(client: &mut Client, uri: &str, needle: &str) -> String {
        for _ in 0..50 {
            let body = text(client.get(uri).await).await;
            if body.contains(needle) {
                return body;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("{uri} never showed {needle}");
    }

    #[tokio::test]
    async fn test_health_and_readiness() {
        let (app, _) = setup().await;
        let mut client = Client::new(app);

        let response = client.get("/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "ok");

        assert_eq!(client.get("/health/ready").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_catalog_marks_unavailable_products() {
        let (app, _) = setup().await;
        let mut client = Client::new(app);

        let response = client.get("/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-frame-options").unwrap(),
            "DENY"
        );
        let body = text(response).await;
        assert!(body.contains("Milk"));
        assert!(body.contains("Unavailable"));
        assert!(body.contains("tel:8090315246"));
    }

    #[tokio::test]
    async fn test_catalog_fragment_filters_by_search() {
        let (app, _) = setup().await;
        let mut client = Client::new(app);

        let body = text(client.get("/products?category=all&q=GHE").await).await;
        assert!(body.contains("Ghee"));
        assert!(!body.contains("Milk"));
        assert!(!body.contains("<html"));
    }

    #[tokio::test]
    async fn test_cart_total_includes_delivery() {
        let (app, _) = setup().await;
        let mut client = Client::new(app);

        client.post("/cart/add", "product_id=milk", true).await;
        let body = text(client.post("/cart/add", "product_id=milk", true).await).await;
        assert!(body.contains("Your cart (2)"));
        assert!(body.contains("Total: ₹220"));

        let body = text(client.post("/cart/update", "product_id=milk&delta=-2", true).await).await;
        assert!(body.contains("Your cart (0)"));
        assert!(body.contains("Total: ₹0"));
    }

    #[tokio::test]
    async fn test_adding_unavailable_product_is_ignored() {
        let (app, _) = setup().await;
        let mut client = Client::new(app);

        let body = text(client.post("/cart/add", "product_id=ghee", true).await).await;
        assert!(body.contains("Your cart (0)"));
        assert!(body.contains("Your cart is empty."));
    }

    #[tokio::test]
    async fn test_checkout_requires_login() {
        let (app, backend) = setup().await;
        let mut client = Client::new(app);

        client.post("/cart/add", "product_id=milk", true).await;
        let body = text(
            client
                .post("/checkout", "name=Asha&phone=98&address=MG+Road", true)
                .await,
        )
        .await;

        assert!(body.contains("Please login to place an order"));
        assert!(body.contains("Your cart (1)"));
        let orders = backend.query(ORDERS, &Query::all()).await.unwrap();
        assert!(orders.documents.is_empty());
    }

    #[tokio::test]
    async fn test_orders_page_redirects_anonymous_customers() {
        let (app, _) = setup().await;
        let mut client = Client::new(app);

        let response = client.get("/orders").await;
        assert!(response.status().is_redirection());
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login"
        );
    }

    #[tokio::test]
    async fn test_failed_login_shows_service_message() {
        let (app, _) = setup().await;
        let mut client = Client::new(app);

        let response = client
            .post("/auth/login", "email=nobody%40example.com&password=secret1", false)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = text(response).await;
        assert!(body.contains("INVALID_LOGIN_CREDENTIALS"));
        assert!(body.contains("nobody@example.com"));
    }

    #[tokio::test]
    async fn test_register_checkout_and_cancel() {
        let (app, backend) = setup().await;
        let mut client = Client::new(app);

        let response = client
            .post("/auth/register", "email=asha%40example.com&password=secret1", false)
            .await;
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

        client.post("/cart/add", "product_id=milk", true).await;
        let body = text(
            client
                .post("/checkout", "name=Asha&phone=98&address=MG+Road", true)
                .await,
        )
        .await;
        assert!(body.contains("Order Placed Successfully!"));
        assert!(body.contains("Your cart (0)"));

        let orders = backend.query(ORDERS, &Query::all()).await.unwrap();
        assert_eq!(orders.documents.len(), 1);
        let order = orders.documents.first().unwrap();
        assert_eq!(order.data["total"], 120);
        assert_eq!(order.data["status"], "pending");

        let body = eventually(&mut client, "/orders", "Milk (x1)").await;
        assert!(body.contains(&format!("/orders/{}/cancel", order.id)));

        let response = client
            .post(&format!("/orders/{}/cancel", order.id), "", false)
            .await;
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/orders");
        assert_eq!(backend.get(ORDERS, &order.id).unwrap()["status"], "cancelled");

        let body = eventually(&mut client, "/orders", "cancelled").await;
        assert!(!body.contains(&format!("/orders/{}/cancel", order.id)));
    }
}
