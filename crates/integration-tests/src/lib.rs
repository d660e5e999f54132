//! Integration tests for Zypso Mart.
//!
//! Each test starts the storefront and the admin on ephemeral ports, both
//! backed by one shared [`MemoryBackend`], and drives them over HTTP the
//! way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p zypso-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use zypso_admin::config::AdminConfig;
use zypso_firebase::{Backend, Fields, MemoryBackend};
use zypso_storefront::config::StorefrontConfig;

/// Both servers and a cookie-keeping browser.
pub struct TestContext {
    pub client: Client,
    pub storefront_url: String,
    pub admin_url: String,
    pub backend: MemoryBackend,
}

impl TestContext {
    /// Start both apps over `backend`.
    pub async fn start(backend: MemoryBackend) -> Self {
        let storefront_state = zypso_storefront::state::AppState::new(
            StorefrontConfig::memory(),
            Backend::memory(backend.clone()),
        );
        let admin_state =
            zypso_admin::state::AppState::new(AdminConfig::memory(), Arc::new(backend.clone()));

        let storefront_url = serve(zypso_storefront::app(storefront_state)).await;
        let admin_url = serve(zypso_admin::app(admin_state)).await;

        let client = Client::builder().cookie_store(true).build().unwrap();
        let ctx = Self {
            client,
            storefront_url,
            admin_url,
            backend,
        };
        ctx.wait_ready().await;
        ctx
    }

    /// Poll both readiness endpoints.
    async fn wait_ready(&self) {
        for base in [&self.storefront_url, &self.admin_url] {
            let url = format!("{base}/health/ready");
            for _ in 0..100 {
                let ready = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .is_ok_and(|r| r.status().is_success());
                if ready {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }

    /// GET a page and return its body.
    pub async fn get(&self, url: &str) -> String {
        self.client.get(url).send().await.unwrap().text().await.unwrap()
    }

    /// POST a form (following redirects) and return the final body.
    pub async fn post(&self, url: &str, form: &[(&str, &str)]) -> String {
        self.client
            .post(url)
            .form(form)
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap()
    }

    /// GET `url` until the body contains `needle`; live projections catch
    /// up asynchronously.
    pub async fn eventually(&self, url: &str, needle: &str) -> String {
        let mut body = String::new();
        for _ in 0..100 {
            body = self.get(url).await;
            if body.contains(needle) {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{url} never contained {needle:?}; last body:\n{body}");
    }

    /// Register a customer, leaving the client signed in.
    pub async fn register(&self, email: &str) {
        let body = self
            .post(
                &format!("{}/auth/register", self.storefront_url),
                &[("email", email), ("password", "secret123")],
            )
            .await;
        assert!(body.contains(email), "registration failed:\n{body}");
    }

    /// Add a product to the cart and place an order.
    pub async fn checkout(&self, product_id: &str, qty: usize) -> String {
        for _ in 0..qty {
            self.post(
                &format!("{}/cart/add", self.storefront_url),
                &[("product_id", product_id)],
            )
            .await;
        }
        self.post(
            &format!("{}/checkout", self.storefront_url),
            &[
                ("name", "Asha"),
                ("phone", "9876543210"),
                ("address", "12 MG Road"),
            ],
        )
        .await
    }
}

/// Serve `app` on an ephemeral loopback port and return its base URL.
async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    format!("http://{addr}")
}

/// JSON object literal as document fields.
pub fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}
