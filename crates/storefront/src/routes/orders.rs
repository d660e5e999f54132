//! Customer order history and order actions.

use std::time::Duration;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::Redirect,
};
use tower_sessions::Session;
use tracing::instrument;

use zypso_core::OrderId;

use crate::error::{AppError, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::orders::{CustomerAction, OrderView, apply_action};
use crate::routes::{ConfirmTemplate, PageChrome};
use crate::state::AppState;

/// How long to wait for the feed to show a confirmed action.
const REFLECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Wait this long for a freshly started feed's first snapshot.
const LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders.html")]
pub struct OrdersTemplate {
    pub chrome: PageChrome,
    pub orders: Vec<OrderView>,
}

/// Display the customer's orders, newest first.
#[instrument(skip(state, session, customer), fields(uid = %customer.uid))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
) -> OrdersTemplate {
    let feed = state.customer_orders().feed(&customer).await;
    let orders = feed.wait_loaded(LOAD_TIMEOUT).await;

    OrdersTemplate {
        chrome: PageChrome::load(&state, &session, Some(&customer)).await,
        orders: orders
            .iter()
            .map(|order| OrderView::new(order, state.clock()))
            .collect(),
    }
}

async fn confirm(
    state: &AppState,
    session: &Session,
    customer: &crate::models::CurrentCustomer,
    id: &str,
    action: CustomerAction,
) -> ConfirmTemplate {
    ConfirmTemplate {
        chrome: PageChrome::load(state, session, Some(customer)).await,
        title: format!("{} order", action.label()),
        prompt: action.prompt().to_string(),
        action: format!("/orders/{id}/{}", action.path()),
        confirm_label: "Yes".to_string(),
        back: "/orders".to_string(),
    }
}

/// Ask before cancelling.
#[instrument(skip(state, session, customer))]
pub async fn confirm_cancel(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
) -> ConfirmTemplate {
    confirm(&state, &session, &customer, &id, CustomerAction::Cancel).await
}

/// Ask before requesting a return.
#[instrument(skip(state, session, customer))]
pub async fn confirm_return(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
) -> ConfirmTemplate {
    confirm(&state, &session, &customer, &id, CustomerAction::Return).await
}

/// Cancel a pending order.
#[instrument(skip(state, customer))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    perform(&state, &customer, OrderId::new(id), CustomerAction::Cancel).await
}

/// Request the return of a delivered order.
#[instrument(skip(state, customer))]
pub async fn request_return(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    perform(&state, &customer, OrderId::new(id), CustomerAction::Return).await
}

async fn perform(
    state: &AppState,
    customer: &crate::models::CurrentCustomer,
    order_id: OrderId,
    action: CustomerAction,
) -> Result<Redirect, AppError> {
    let status = apply_action(state.store(), customer, &order_id, action).await?;
    add_breadcrumb(
        "orders",
        action.label(),
        &[("order_id", order_id.as_str()), ("status", status.as_str())],
    );

    // Give the live feed a moment so the list shows the new status.
    let feed = state.customer_orders().feed(customer).await;
    let reflected = tokio::time::timeout(
        REFLECT_TIMEOUT,
        feed.projection().wait_for(|orders| {
            orders
                .iter()
                .any(|order| order.id == order_id && order.status == status)
        }),
    )
    .await;
    if reflected.is_err() {
        tracing::debug!(order_id = %order_id, "Order feed has not caught up yet");
    }

    Ok(Redirect::to("/orders"))
}
