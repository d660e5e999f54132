//! The signed-in customer's orders.
//!
//! Each customer gets one live projection of `orders where userId == uid`,
//! newest first, scoped to their ID token. Projections are cached by user ID:
//! started on login, dropped on logout, and evicted after
//! [`IDLE_TIMEOUT`] without a read (which cancels the subscription).
//!
//! Customers may cancel a pending order or ask to return a delivered one.
//! Both checks run against a fresh read of the order, not the projection.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use thiserror::Error;

use zypso_core::collections::{CREATED_AT, ORDERS, USER_ID};
use zypso_core::format::ShopClock;
use zypso_core::{Order, OrderId, OrderStatus, StatusUpdate, UserId};
use zypso_firebase::{Direction, DocumentStore, Projection, Query, StoreError, to_fields};

use crate::models::CurrentCustomer;

/// How long an unread order feed stays subscribed.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Upper bound on concurrently cached feeds.
const MAX_FEEDS: u64 = 10_000;

/// A live view of one customer's orders.
#[derive(Debug)]
pub struct OrderFeed {
    projection: Projection<Order>,
    token_expires_at: DateTime<Utc>,
}

impl OrderFeed {
    /// The customer's orders, newest first.
    #[must_use]
    pub fn current(&self) -> Arc<Vec<Order>> {
        self.projection.current()
    }

    /// The underlying projection.
    #[must_use]
    pub const fn projection(&self) -> &Projection<Order> {
        &self.projection
    }

    /// Wait up to `limit` for the first snapshot.
    pub async fn wait_loaded(&self, limit: Duration) -> Arc<Vec<Order>> {
        if !self.projection.is_loaded() {
            let _ = tokio::time::timeout(limit, self.projection.wait_for(|_| true)).await;
        }
        self.projection.current()
    }
}

/// Per-customer order feeds keyed by user ID.
#[derive(Clone)]
pub struct CustomerOrders {
    store: Arc<dyn DocumentStore>,
    feeds: Cache<UserId, Arc<OrderFeed>>,
}

impl CustomerOrders {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let feeds = Cache::builder()
            .max_capacity(MAX_FEEDS)
            .time_to_idle(IDLE_TIMEOUT)
            .build();
        Self { store, feeds }
    }

    /// The customer's feed, subscribing if there is none or if it was
    /// started with an older token.
    pub async fn feed(&self, customer: &CurrentCustomer) -> Arc<OrderFeed> {
        if let Some(feed) = self.feeds.get(&customer.uid).await
            && feed.token_expires_at >= customer.expires_at
        {
            return feed;
        }

        let feed = Arc::new(self.subscribe(customer));
        self.feeds.insert(customer.uid.clone(), Arc::clone(&feed)).await;
        tracing::debug!(uid = %customer.uid, "Order feed started");
        feed
    }

    /// Drop the customer's feed, cancelling its subscription.
    pub async fn stop(&self, uid: &UserId) {
        self.feeds.invalidate(uid).await;
        tracing::debug!(uid = %uid, "Order feed stopped");
    }

    /// Number of cached feeds.
    pub async fn len(&self) -> u64 {
        self.feeds.run_pending_tasks().await;
        self.feeds.entry_count()
    }

    fn subscribe(&self, customer: &CurrentCustomer) -> OrderFeed {
        let query = Query::all()
            .where_eq(USER_ID, customer.uid.as_str())
            .order_by(CREATED_AT, Direction::Descending);
        let live = self
            .store
            .with_token(&customer.id_token())
            .subscribe(ORDERS, query);

        OrderFeed {
            projection: Projection::spawn(ORDERS, live),
            token_expires_at: customer.expires_at,
        }
    }
}

// =============================================================================
// Customer Actions
// =============================================================================

/// A status change a customer may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerAction {
    Cancel,
    Return,
}

impl CustomerAction {
    /// The status an order must have for the action to be offered.
    #[must_use]
    pub const fn required_status(self) -> OrderStatus {
        match self {
            Self::Cancel => OrderStatus::Pending,
            Self::Return => OrderStatus::Delivered,
        }
    }

    /// The status written when the action is confirmed.
    #[must_use]
    pub const fn next_status(self) -> OrderStatus {
        match self {
            Self::Cancel => OrderStatus::Cancelled,
            Self::Return => OrderStatus::ReturnPending,
        }
    }

    /// Confirmation question.
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::Cancel => "Are you sure you want to cancel this order?",
            Self::Return => "Request a return for this order?",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cancel => "Cancel",
            Self::Return => "Return",
        }
    }

    /// URL path segment (`/orders/{id}/cancel`).
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Return => "return",
        }
    }

    /// Whether the action applies to an order in `status`.
    #[must_use]
    pub fn allowed_for(self, status: OrderStatus) -> bool {
        status == self.required_status()
    }
}

/// Errors from a customer order action.
#[derive(Debug, Error)]
pub enum OrderActionError {
    /// No such order, or it belongs to someone else.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// The order's current status does not offer this action.
    #[error("order is {status}; cannot {action}")]
    NotAllowed {
        status: OrderStatus,
        action: &'static str,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Apply `action` to one of the customer's orders.
///
/// # Errors
///
/// Returns `OrderActionError::NotFound` for unknown or foreign orders,
/// `NotAllowed` when the order's status does not permit the action, and
/// `Store` when the read or the update fails.
#[tracing::instrument(skip(store, customer), fields(uid = %customer.uid))]
pub async fn apply_action(
    store: &dyn DocumentStore,
    customer: &CurrentCustomer,
    order_id: &OrderId,
    action: CustomerAction,
) -> Result<OrderStatus, OrderActionError> {
    let scoped = store.with_token(&customer.id_token());

    let order: Order = scoped
        .get_document(ORDERS, order_id.as_str())
        .await?
        .and_then(|doc| doc.decode().ok())
        .filter(|order: &Order| order.user_id == customer.uid)
        .ok_or_else(|| OrderActionError::NotFound(order_id.clone()))?;

    if !action.allowed_for(order.status) {
        return Err(OrderActionError::NotAllowed {
            status: order.status,
            action: action.path(),
        });
    }

    let next = action.next_status();
    scoped
        .update(
            ORDERS,
            order_id.as_str(),
            to_fields(&StatusUpdate { status: next })?,
        )
        .await?;

    tracing::info!(order_id = %order_id, status = %next, "Order status updated by customer");
    Ok(next)
}

// =============================================================================
// Views
// =============================================================================

/// One order card on the customer's orders page.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    /// Shop-local date, `...` until the server timestamp lands.
    pub date: String,
    pub time: String,
    /// Wire status, used as a CSS modifier.
    pub status: String,
    pub status_label: String,
    /// `Milk (x2), Bread (x1)`
    pub summary: String,
    pub total: String,
    pub actions: Vec<ActionLink>,
}

/// A per-order action button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLink {
    pub label: &'static str,
    pub href: String,
    pub danger: bool,
}

impl OrderView {
    #[must_use]
    pub fn new(order: &Order, clock: &ShopClock) -> Self {
        let (date, time) = order.created_at.map_or_else(
            || ("...".to_string(), String::new()),
            |at| (clock.date(at), clock.time(at)),
        );

        let summary = order
            .items
            .iter()
            .map(|item| format!("{} (x{})", item.name, item.qty))
            .collect::<Vec<_>>()
            .join(", ");

        let actions = [CustomerAction::Cancel, CustomerAction::Return]
            .into_iter()
            .filter(|action| action.allowed_for(order.status))
            .map(|action| ActionLink {
                label: action.label(),
                href: format!("/orders/{}/{}", order.id, action.path()),
                danger: action == CustomerAction::Cancel,
            })
            .collect();

        Self {
            id: order.id.to_string(),
            date,
            time,
            status: order.status.as_str().to_string(),
            status_label: order.status.display_name(),
            summary,
            total: order.total.to_string(),
            actions,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use secrecy::SecretString;
    use serde_json::json;
    use zypso_core::{LineItem, Price, ProductId};
    use zypso_firebase::{AuthSession, MemoryBackend};

    fn customer(uid: &str) -> CurrentCustomer {
        CurrentCustomer::from(&AuthSession {
            uid: uid.to_string(),
            email: format!("{uid}@example.com"),
            id_token: SecretString::from("token"),
            refresh_token: SecretString::from("refresh"),
            expires_at: Utc::now() + ChronoDuration::hours(1),
        })
    }

    fn order(status: OrderStatus) -> Order {
        Order {
            id: OrderId::new("o1"),
            user_id: UserId::new("u1"),
            customer_name: "Asha".to_string(),
            customer_phone: "9".to_string(),
            customer_address: "MG Road".to_string(),
            items: vec![
                LineItem {
                    id: ProductId::new("p1"),
                    name: "Milk".to_string(),
                    price: Price::new(30),
                    unit: "litre".to_string(),
                    qty: 2,
                },
                LineItem {
                    id: ProductId::new("p2"),
                    name: "Bread".to_string(),
                    price: Price::new(40),
                    unit: "piece".to_string(),
                    qty: 1,
                },
            ],
            total: Price::new(120),
            status,
            created_at: None,
        }
    }

    fn seed_order(backend: &MemoryBackend, id: &str, uid: &str, status: &str) {
        let Some(fields) = json!({
            "userId": uid,
            "items": [],
            "total": 50,
            "status": status,
        })
        .as_object()
        .cloned() else {
            panic!("object");
        };
        backend.put(ORDERS, id, fields);
    }

    #[test]
    fn test_view_actions_follow_status() {
        let clock = ShopClock::default();

        let pending = OrderView::new(&order(OrderStatus::Pending), &clock);
        assert_eq!(pending.actions.len(), 1);
        assert_eq!(pending.actions[0].label, "Cancel");
        assert_eq!(pending.actions[0].href, "/orders/o1/cancel");

        let delivered = OrderView::new(&order(OrderStatus::Delivered), &clock);
        assert_eq!(delivered.actions[0].label, "Return");

        for status in [
            OrderStatus::Cancelled,
            OrderStatus::ReturnPending,
            OrderStatus::Returned,
        ] {
            assert!(OrderView::new(&order(status), &clock).actions.is_empty());
        }
    }

    #[test]
    fn test_view_formats_summary_and_pending_timestamp() {
        let view = OrderView::new(&order(OrderStatus::ReturnPending), &ShopClock::default());
        assert_eq!(view.summary, "Milk (x2), Bread (x1)");
        assert_eq!(view.date, "...");
        assert_eq!(view.status_label, "return pending");
        assert_eq!(view.total, "₹120");
    }

    #[tokio::test]
    async fn test_cancel_pending_order() {
        let backend = MemoryBackend::new();
        seed_order(&backend, "o1", "u1", "pending");

        let status = apply_action(
            &backend,
            &customer("u1"),
            &OrderId::new("o1"),
            CustomerAction::Cancel,
        )
        .await
        .unwrap();

        assert_eq!(status, OrderStatus::Cancelled);
        assert_eq!(backend.get(ORDERS, "o1").unwrap()["status"], "cancelled");
    }

    #[tokio::test]
    async fn test_return_requires_delivered() {
        let backend = MemoryBackend::new();
        seed_order(&backend, "o1", "u1", "pending");

        let err = apply_action(
            &backend,
            &customer("u1"),
            &OrderId::new("o1"),
            CustomerAction::Return,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, OrderActionError::NotAllowed { .. }));
        assert_eq!(backend.get(ORDERS, "o1").unwrap()["status"], "pending");
    }

    #[tokio::test]
    async fn test_foreign_order_is_not_found() {
        let backend = MemoryBackend::new();
        seed_order(&backend, "o1", "someone-else", "pending");

        let err = apply_action(
            &backend,
            &customer("u1"),
            &OrderId::new("o1"),
            CustomerAction::Cancel,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, OrderActionError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_feed_shows_only_own_orders_and_stops() {
        let backend = MemoryBackend::new();
        seed_order(&backend, "o1", "u1", "pending");
        seed_order(&backend, "o2", "u2", "pending");

        let orders = CustomerOrders::new(Arc::new(backend.clone()));
        let feed = orders.feed(&customer("u1")).await;
        let loaded = feed.wait_loaded(std::time::Duration::from_secs(1)).await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, OrderId::new("o1"));

        let again = orders.feed(&customer("u1")).await;
        assert!(Arc::ptr_eq(&feed, &again));
        drop(again);

        orders.stop(&UserId::new("u1")).await;
        assert_eq!(orders.len().await, 0);
    }
}
