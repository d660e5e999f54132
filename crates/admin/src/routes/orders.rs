//! Orders dashboard route handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use zypso_core::{OrderId, OrderStatus};

use crate::error::{AppError, add_breadcrumb};
use crate::orders::{OrderRow, set_status};
use crate::reports::{DateRange, DateRangeQuery, SalesSummary};
use crate::routes::{is_htmx, render};
use crate::state::AppState;

/// Form input for a status change.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Revenue panel values.
#[derive(Debug, Clone)]
pub struct SummaryView {
    pub revenue: String,
    pub units_sold: u64,
    pub delivered: usize,
    pub orders: usize,
}

impl From<SalesSummary> for SummaryView {
    fn from(summary: SalesSummary) -> Self {
        Self {
            revenue: summary.revenue.to_string(),
            units_sold: summary.units_sold,
            delivered: summary.delivered,
            orders: summary.orders,
        }
    }
}

/// Orders table and revenue panel.
#[derive(Template)]
#[template(path = "partials/orders_table.html")]
pub struct OrdersTableTemplate {
    pub query: String,
    pub summary: SummaryView,
    pub rows: Vec<OrderRow>,
}

/// Orders page template. Includes the table partial.
#[derive(Template)]
#[template(path = "orders.html")]
pub struct OrdersTemplate {
    pub current_path: String,
    pub start: String,
    pub end: String,
    pub query: String,
    pub summary: SummaryView,
    pub rows: Vec<OrderRow>,
}

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/orders/table", get(table))
        .route("/orders/{id}/status", post(update_status))
}

fn build_table(state: &AppState, range: &DateRange) -> OrdersTableTemplate {
    let orders = state.orders().current();
    let clock = state.clock();
    let filtered = range.filter(&orders, clock);

    OrdersTableTemplate {
        query: range.query_string(),
        summary: SalesSummary::from_orders(filtered.iter().copied()).into(),
        rows: filtered
            .into_iter()
            .map(|order| OrderRow::new(order, clock))
            .collect(),
    }
}

/// Orders overview.
///
/// GET /
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> Html<String> {
    let range = DateRange::from_query(&query);
    let OrdersTableTemplate {
        query,
        summary,
        rows,
    } = build_table(&state, &range);

    render(&OrdersTemplate {
        current_path: "/".to_string(),
        start: range.start_value(),
        end: range.end_value(),
        query,
        summary,
        rows,
    })
}

/// Table fragment, refetched on every order change.
///
/// GET /orders/table
#[instrument(skip(state))]
pub async fn table(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> Html<String> {
    render(&build_table(&state, &DateRange::from_query(&query)))
}

/// Set an order's status. Applied immediately; the table refreshes from
/// the live projection.
///
/// POST /orders/{id}/status
#[instrument(skip(state, headers))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<StatusForm>,
) -> Result<Response, AppError> {
    let status: OrderStatus = form.status.parse().map_err(AppError::BadRequest)?;
    let order_id = OrderId::new(id);

    set_status(state.store(), &order_id, status).await?;
    add_breadcrumb(
        "order",
        "Status changed",
        &[("order_id", order_id.as_str()), ("status", status.as_str())],
    );

    if is_htmx(&headers) {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok(Redirect::to("/").into_response())
    }
}
