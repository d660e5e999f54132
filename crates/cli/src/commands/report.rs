//! Sales report over delivered orders.

use chrono::NaiveDate;
use tracing::info;

use zypso_admin::reports::{DateRange, SalesSummary};
use zypso_core::Order;
use zypso_core::collections::ORDERS;
use zypso_core::format::ShopClock;
use zypso_firebase::{DocumentStore, Query, StoreError};

/// Read every order once and aggregate those inside `range`.
///
/// # Errors
///
/// Returns `StoreError` if the query fails.
pub async fn summarize(
    store: &dyn DocumentStore,
    range: &DateRange,
    clock: &ShopClock,
) -> Result<SalesSummary, StoreError> {
    let snapshot = store.query(ORDERS, &Query::all()).await?;
    let orders: Vec<Order> = snapshot.decode_all(ORDERS);
    Ok(SalesSummary::from_orders(range.filter(&orders, clock)))
}

/// Log the report.
///
/// # Errors
///
/// Returns an error if the orders cannot be read.
pub async fn print(
    store: &dyn DocumentStore,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    clock: &ShopClock,
) -> Result<(), Box<dyn std::error::Error>> {
    let range = DateRange::new(start, end);
    let summary = summarize(store, &range, clock).await?;

    info!("Sales report");
    info!("============");
    info!(
        "Period: {} to {}",
        start.map_or_else(|| "beginning".to_string(), |d| d.to_string()),
        end.map_or_else(|| "today".to_string(), |d| d.to_string()),
    );
    info!("Orders: {}", summary.orders);
    info!("Delivered: {}", summary.delivered);
    info!("Revenue: {}", summary.revenue);
    info!("Units sold: {}", summary.units_sold);

    Ok(())
}
