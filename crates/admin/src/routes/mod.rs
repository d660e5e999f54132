//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Orders
//! GET  /                                  - Orders table, revenue, units sold (?start=&end=)
//! GET  /orders/table                      - Orders table fragment (HTMX)
//! POST /orders/{id}/status                - Set status (form: status)
//!
//! # Inventory
//! GET  /inventory                         - Products, add form, categories
//! POST /inventory/products                - Add product
//! GET  /inventory/products/{id}/edit      - Edit form
//! POST /inventory/products/{id}           - Save edit
//! POST /inventory/products/{id}/stock     - Stock toggle (form: status)
//! GET  /inventory/products/{id}/delete    - Confirm delete
//! POST /inventory/products/{id}/delete    - Delete product
//! POST /inventory/categories              - Add category (form: name)
//! GET  /inventory/categories/{id}/delete  - Confirm delete
//! POST /inventory/categories/{id}/delete  - Delete category
//!
//! # Settings
//! GET  /settings                          - Shop settings form
//! POST /settings                          - Merge-write settings
//!
//! # Live updates
//! GET  /events                            - Server-sent events: orders, products, categories, settings
//! ```
//!
//! There is no login. The server binds to loopback unless told otherwise.

pub mod events;
pub mod inventory;
pub mod orders;
pub mod settings;

use askama::Template;
use axum::{
    Router,
    http::HeaderMap,
    response::Html,
    routing::get,
};
use serde::Deserialize;

use crate::state::AppState;

/// Render a template, logging failures.
pub(crate) fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Whether the request came from HTMX.
pub(crate) fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .is_some_and(|value| value.as_bytes() == b"true")
}

/// `?success=` / `?error=` flash codes set by redirects.
#[derive(Debug, Default, Deserialize)]
pub struct FlashParams {
    pub success: Option<String>,
    pub error: Option<String>,
}

/// A yes/no confirmation page for a delete.
#[derive(Template)]
#[template(path = "confirm.html")]
pub struct ConfirmTemplate {
    pub current_path: String,
    pub title: String,
    pub prompt: String,
    /// Form action that performs the delete.
    pub action: String,
    /// Where "No" goes.
    pub back: String,
}

/// Create all routes for the admin dashboard.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(orders::router())
        .merge(inventory::router())
        .merge(settings::router())
        .route("/events", get(events::stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));

        headers.insert("hx-request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }
}
