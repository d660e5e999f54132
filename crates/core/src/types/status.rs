//! Status enums for orders and products.
//!
//! Order statuses are stored lowercase (`pending`, `return_pending`, ...).
//! Product availability is stored with the capitalized labels the admin
//! dashboard writes (`Available`, `Unavailable`); the legacy `Out of Stock`
//! value is still read and treated as unavailable.
//!
//! Status transitions are not guarded. The usual lifecycle is
//! `pending -> {delivered, cancelled, return_pending}` and
//! `return_pending -> returned`, but the admin dashboard may set any status
//! on any order.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed by the customer, awaiting delivery.
    #[default]
    Pending,
    /// Delivered. The only status counted as a sale.
    Delivered,
    /// Cancelled by the customer or the shop.
    Cancelled,
    /// Customer asked for a return; waiting for the shop.
    ReturnPending,
    /// Return accepted.
    Returned,
}

impl OrderStatus {
    /// Every status, in the order the admin selector lists them.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Delivered,
        Self::Cancelled,
        Self::ReturnPending,
        Self::Returned,
    ];

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::ReturnPending => "return_pending",
            Self::Returned => "returned",
        }
    }

    /// Label used by the admin status selector.
    #[must_use]
    pub const fn admin_label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::ReturnPending => "Return Req",
            Self::Returned => "Accepted/Returned",
        }
    }

    /// Label shown to customers (`return pending`).
    #[must_use]
    pub fn display_name(self) -> String {
        self.as_str().replacen('_', " ", 1)
    }

    /// Whether orders in this status count toward revenue and units sold.
    #[must_use]
    pub const fn counts_as_sale(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Product availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProductStatus {
    /// Hidden from purchase; shown with a disabled button.
    Unavailable,
    /// Legacy spelling of [`ProductStatus::Unavailable`].
    #[serde(rename = "Out of Stock")]
    OutOfStock,
    /// Can be added to the cart. Unknown values fall back here.
    #[default]
    #[serde(other)]
    Available,
}

impl ProductStatus {
    /// Values offered by the admin stock toggle.
    pub const TOGGLE_OPTIONS: [Self; 2] = [Self::Available, Self::Unavailable];

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Unavailable => "Unavailable",
            Self::OutOfStock => "Out of Stock",
        }
    }

    /// Whether the product can be added to a cart.
    #[must_use]
    pub const fn is_purchasable(self) -> bool {
        matches!(self, Self::Available)
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(Self::Available),
            "Unavailable" => Ok(Self::Unavailable),
            "Out of Stock" => Ok(Self::OutOfStock),
            _ => Err(format!("invalid product status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_values() {
        let json = serde_json::to_string(&OrderStatus::ReturnPending).unwrap();
        assert_eq!(json, "\"return_pending\"");

        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_status_labels() {
        assert_eq!(OrderStatus::ReturnPending.display_name(), "return pending");
        assert_eq!(OrderStatus::Returned.admin_label(), "Accepted/Returned");
    }

    #[test]
    fn test_only_delivered_counts_as_sale() {
        let sales: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| s.counts_as_sale())
            .collect();
        assert_eq!(sales, vec![OrderStatus::Delivered]);
    }

    #[test]
    fn test_product_status_legacy_and_unknown_values() {
        let legacy: ProductStatus = serde_json::from_str("\"Out of Stock\"").unwrap();
        assert_eq!(legacy, ProductStatus::OutOfStock);
        assert!(!legacy.is_purchasable());

        let unknown: ProductStatus = serde_json::from_str("\"In Stock\"").unwrap();
        assert_eq!(unknown, ProductStatus::Available);
        assert!(unknown.is_purchasable());
    }
}
