//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog page (?category=&q=)
//! GET  /products               - Catalog fragment (HTMX)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart sidebar
//! POST /cart/add               - Add one unit (form: product_id)
//! POST /cart/update            - Adjust quantity (form: product_id, delta)
//! POST /checkout               - Place order (form: name, phone, address)
//!
//! # Orders (requires auth)
//! GET  /orders                 - Customer's orders
//! GET  /orders/{id}/cancel     - Confirm cancellation
//! POST /orders/{id}/cancel     - Cancel a pending order
//! GET  /orders/{id}/return     - Confirm return request
//! POST /orders/{id}/return     - Request return of a delivered order
//!
//! # Auth (rate limited)
//! GET  /auth/login             - Login / register page
//! POST /auth/login             - Login action
//! POST /auth/register          - Register action
//! GET  /auth/logout            - Confirm logout
//! POST /auth/logout            - Logout action
//!
//! # Live updates
//! GET  /events                 - Server-sent events: catalog, categories, settings
//! ```

pub mod auth;
pub mod cart;
pub mod events;
pub mod home;
pub mod orders;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::cart as session_cart;
use crate::middleware::auth_rate_limiter;
use crate::models::CurrentCustomer;
use crate::settings::ShopStatusView;
use crate::state::AppState;

/// Header HTMX sets on every request it issues.
const HX_REQUEST: &str = "hx-request";

/// Whether the request came from HTMX (and wants a fragment back).
pub(crate) fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .is_some_and(|value| value.as_bytes() == b"true")
}

/// Header, footer and overlay data shared by every full page.
#[derive(Debug, Clone)]
pub struct PageChrome {
    pub shop: ShopStatusView,
    pub customer_email: Option<String>,
    pub cart_count: u32,
}

impl PageChrome {
    /// Build the chrome for the current session.
    pub async fn load(
        state: &AppState,
        session: &Session,
        customer: Option<&CurrentCustomer>,
    ) -> Self {
        let cart = session_cart::load(session).await;
        Self {
            shop: ShopStatusView::new(&state.settings(), state.clock()),
            customer_email: customer.map(|c| c.email.clone()),
            cart_count: cart.item_count(),
        }
    }
}

/// A yes/no confirmation page for a destructive action.
#[derive(askama::Template, askama_web::WebTemplate)]
#[template(path = "confirm.html")]
pub struct ConfirmTemplate {
    pub chrome: PageChrome,
    pub title: String,
    pub prompt: String,
    /// Form action that performs the change.
    pub action: String,
    pub confirm_label: String,
    /// Where "No" goes.
    pub back: String,
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route(
            "/{id}/cancel",
            get(orders::confirm_cancel).post(orders::cancel),
        )
        .route(
            "/{id}/return",
            get(orders::confirm_return).post(orders::request_return),
        )
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", get(auth::logout_page).post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/products", get(home::catalog))
        .nest("/cart", cart_routes())
        .route("/checkout", post(cart::checkout))
        .nest("/orders", order_routes())
        .nest("/auth", auth_routes())
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

        headers.insert(HX_REQUEST, HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }
}
