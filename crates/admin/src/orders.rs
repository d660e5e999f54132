//! Order table rows and status changes.
//!
//! The admin may move an order to any status at any time. Transitions are
//! not checked here: a customer's pending order can go straight to
//! `returned`, and a cancelled one can be revived.

use zypso_core::collections::ORDERS;
use zypso_core::format::ShopClock;
use zypso_core::{Order, OrderId, OrderStatus, StatusUpdate};
use zypso_firebase::{DocumentStore, StoreError, to_fields};

/// Overwrite an order's status.
///
/// # Errors
///
/// Returns `StoreError` when the order does not exist or the write fails.
#[tracing::instrument(skip(store))]
pub async fn set_status(
    store: &dyn DocumentStore,
    order_id: &OrderId,
    status: OrderStatus,
) -> Result<(), StoreError> {
    store
        .update(ORDERS, order_id.as_str(), to_fields(&StatusUpdate { status })?)
        .await?;
    tracing::info!(order_id = %order_id, status = %status, "Order status set by admin");
    Ok(())
}

/// One `<option>` of a status selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// One row of the orders table.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    /// Shop-local date, `...` until the server timestamp lands.
    pub date: String,
    pub customer: String,
    pub phone: String,
    pub address: String,
    /// `Milk (x2), Bread (x1)`
    pub items: String,
    pub total: String,
    pub status: &'static str,
    pub options: Vec<StatusOption>,
}

impl OrderRow {
    #[must_use]
    pub fn new(order: &Order, clock: &ShopClock) -> Self {
        Self {
            id: order.id.to_string(),
            date: order
                .created_at
                .map_or_else(|| "...".to_string(), |at| clock.date(at)),
            customer: order.customer_name.clone(),
            phone: order.customer_phone.clone(),
            address: order.customer_address.clone(),
            items: order
                .items
                .iter()
                .map(|item| format!("{} (x{})", item.name, item.qty))
                .collect::<Vec<_>>()
                .join(", "),
            total: order.total.to_string(),
            status: order.status.as_str(),
            options: status_options(order.status),
        }
    }
}

/// Every status, with `current` selected.
#[must_use]
pub fn status_options(current: OrderStatus) -> Vec<StatusOption> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| StatusOption {
            value: status.as_str(),
            label: status.admin_label(),
            selected: status == current,
        })
        .collect()
}
