//! Records mirrored from the document store.
//!
//! Each record has a read shape (decoded from a snapshot, with the document
//! ID injected as `id`) and one or more write payloads that carry only the
//! fields a given mutation touches. Wire names are camelCase.

pub mod category;
pub mod order;
pub mod product;
pub mod settings;

pub use category::{Category, NewCategory};
pub use order::{LineItem, NewOrder, Order, StatusUpdate};
pub use product::{NewProduct, Product, ProductEdit, StockUpdate};
pub use settings::{DEFAULT_SUPPORT_NUMBER, SHOP_STATUS_DOCUMENT, SettingsUpdate, ShopSettings};

/// Collection and field names used by the shop.
pub mod collections {
    /// Product catalog.
    pub const PRODUCTS: &str = "products";
    /// Product categories.
    pub const CATEGORIES: &str = "categories";
    /// Customer orders.
    pub const ORDERS: &str = "orders";
    /// Holds the singleton shop settings document.
    pub const SHOP_CONTROL: &str = "shopControl";

    /// Server-assigned creation time on products and orders.
    pub const CREATED_AT: &str = "createdAt";
    /// Owning identity on orders.
    pub const USER_ID: &str = "userId";
}

/// Default unit label for products and line items.
pub const DEFAULT_UNIT: &str = "piece";

pub(crate) mod serde_helpers {
    use serde::{Deserialize, Deserializer};

    use super::DEFAULT_UNIT;

    pub fn default_unit() -> String {
        DEFAULT_UNIT.to_owned()
    }

    /// Missing, null and empty units all read as `piece`.
    pub fn unit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let unit = Option::<String>::deserialize(deserializer)?;
        Ok(unit
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(default_unit))
    }

    /// Empty strings read as absent.
    pub fn non_empty<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|v| !v.trim().is_empty()))
    }
}
