//! Customer orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::serde_helpers;
use crate::types::{OrderId, OrderStatus, Price, ProductId, UserId};

/// A product snapshot captured when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(
        default = "serde_helpers::default_unit",
        deserialize_with = "serde_helpers::unit"
    )]
    pub unit: String,
    pub qty: u32,
}

impl LineItem {
    /// `price x qty`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.qty
    }
}

/// An order as read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_address: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub total: Price,
    #[serde(default)]
    pub status: OrderStatus,
    /// Absent until the server has committed the write.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Sum of line-item quantities.
    #[must_use]
    pub fn units(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.qty)).sum()
    }
}

/// Payload for placing an order. `createdAt` is assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: UserId,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub items: Vec<LineItem>,
    pub total: Price,
    pub status: OrderStatus,
}

/// Status-only update, used by both customers and the admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}
