//! Cart and checkout route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads:
//! HTMX requests get the cart sidebar fragment back, plain form posts get
//! the whole catalog page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use zypso_core::{ProductId, ShopSettings};

use crate::cart::{self as session_cart, Cart};
use crate::catalog::CatalogFilter;
use crate::checkout::{CheckoutForm, ORDER_PLACED, place_order};
use crate::error::{AppError, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::models::CurrentCustomer;
use crate::routes::home::{CatalogView, IndexTemplate};
use crate::routes::{PageChrome, is_htmx};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub qty: u32,
    pub line_total: String,
}

/// Cart sidebar display data for templates.
#[derive(Debug, Clone, Default)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub count: u32,
    pub delivery_charge: String,
    pub total: String,
    /// Outcome of the last checkout attempt.
    pub message: Option<String>,
    pub is_error: bool,
    /// Delivery details to re-fill after a failed checkout.
    pub form: CheckoutForm,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, settings: &ShopSettings) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartLineView {
                    id: item.id.to_string(),
                    name: item.name.clone(),
                    price: item.price.to_string(),
                    qty: item.qty,
                    line_total: item.line_total().to_string(),
                })
                .collect(),
            count: cart.item_count(),
            delivery_charge: settings.delivery_charge.to_string(),
            total: cart.total(settings.delivery_charge).to_string(),
            message: None,
            is_error: false,
            form: CheckoutForm::default(),
        }
    }

    #[must_use]
    fn with_message(mut self, message: String, is_error: bool) -> Self {
        self.message = Some(message);
        self.is_error = is_error;
        self
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub delta: i32,
}

/// Cart sidebar fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart.html")]
pub struct CartTemplate {
    pub cart: CartView,
}

/// Answer a cart mutation with the fragment or the full page.
async fn respond(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    customer: Option<&CurrentCustomer>,
    cart: CartView,
) -> Response {
    if is_htmx(headers) {
        return CartTemplate { cart }.into_response();
    }

    IndexTemplate {
        chrome: PageChrome::load(state, session, customer).await,
        catalog: CatalogView::build(state, &CatalogFilter::default()),
        cart,
    }
    .into_response()
}

/// Display the cart sidebar (HTMX).
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> CartTemplate {
    let cart = session_cart::load(&session).await;
    CartTemplate {
        cart: CartView::new(&cart, &state.settings()),
    }
}

/// Add one unit of a product.
///
/// Unknown and unavailable products leave the cart unchanged.
#[instrument(skip(state, session, headers, customer))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    OptionalAuth(customer): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let mut cart = session_cart::load(&session).await;
    let products = state.products().current();
    let product_id = ProductId::new(form.product_id);

    let added = products
        .iter()
        .find(|p| p.id == product_id)
        .is_some_and(|product| cart.add(product));
    if added {
        session_cart::save(&session, &cart).await?;
        add_breadcrumb("cart", "Added to cart", &[("product_id", product_id.as_str())]);
    } else {
        tracing::debug!(product_id = %product_id, "Ignoring add of unknown or unavailable product");
    }

    let view = CartView::new(&cart, &state.settings());
    Ok(respond(&state, &session, &headers, customer.as_ref(), view).await)
}

/// Adjust a line's quantity by `delta`, removing it at zero.
#[instrument(skip(state, session, headers, customer))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    OptionalAuth(customer): OptionalAuth,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response, AppError> {
    let mut cart = session_cart::load(&session).await;
    if cart.update_qty(&ProductId::new(form.product_id), form.delta) {
        session_cart::save(&session, &cart).await?;
    }

    let view = CartView::new(&cart, &state.settings());
    Ok(respond(&state, &session, &headers, customer.as_ref(), view).await)
}

/// Place an order for the cart.
///
/// On success the cart is cleared and the confirmation shown; on failure
/// the cart and the delivery details are kept and the reason shown.
#[instrument(skip(state, session, headers, customer, form))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    OptionalAuth(customer): OptionalAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    let cart = session_cart::load(&session).await;
    let settings = state.settings();

    let view = match place_order(
        state.store(),
        customer.as_ref(),
        &form,
        &cart,
        settings.delivery_charge,
    )
    .await
    {
        Ok(order_id) => {
            let empty = Cart::default();
            session_cart::save(&session, &empty).await?;
            add_breadcrumb("checkout", "Order placed", &[("order_id", order_id.as_str())]);
            CartView::new(&empty, &settings).with_message(ORDER_PLACED.to_string(), false)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Checkout failed");
            CartView {
                form,
                ..CartView::new(&cart, &settings)
            }
            .with_message(e.to_string(), true)
        }
    };

    Ok(respond(&state, &session, &headers, customer.as_ref(), view).await)
}
