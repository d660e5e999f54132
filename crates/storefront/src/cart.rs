//! Per-session shopping cart.
//!
//! The cart lives in the customer's session and never touches the document
//! store until checkout. Each line snapshots the product at the time it was
//! added; quantities are always at least 1 and a line that would drop to 0
//! is removed.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use zypso_core::{LineItem, Price, Product, ProductId};

use crate::models::session_keys;

/// A product snapshot with a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub unit: String,
    pub image: String,
    pub qty: u32,
}

impl CartItem {
    fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            unit: product.unit.clone(),
            image: product.image_or_placeholder().to_owned(),
            qty: 1,
        }
    }

    /// `price x qty`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.qty
    }

    /// The order line written at checkout.
    #[must_use]
    pub fn to_line_item(&self) -> LineItem {
        LineItem {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            unit: self.unit.clone(),
            qty: self.qty,
        }
    }
}

/// The lines in a customer's cart, in the order they were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Add one unit of `product`.
    ///
    /// Returns `false` without changing the cart when the product is not
    /// available.
    pub fn add(&mut self, product: &Product) -> bool {
        if !product.is_available() {
            return false;
        }

        match self.items.iter_mut().find(|item| item.id == product.id) {
            Some(item) => item.qty = item.qty.saturating_add(1),
            None => self.items.push(CartItem::from_product(product)),
        }
        true
    }

    /// Adjust the quantity of a line by `delta`, removing it at zero.
    ///
    /// Returns `false` when no line matches `id`.
    pub fn update_qty(&mut self, id: &ProductId, delta: i32) -> bool {
        let Some(index) = self.items.iter().position(|item| &item.id == id) else {
            return false;
        };

        let remaining = self
            .items
            .get(index)
            .map_or(0, |item| i64::from(item.qty) + i64::from(delta));
        match u32::try_from(remaining) {
            Ok(qty) if qty > 0 => {
                if let Some(item) = self.items.get_mut(index) {
                    item.qty = qty;
                }
            }
            _ => {
                self.items.remove(index);
            }
        }
        true
    }

    /// The cart lines.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |count, item| count.saturating_add(item.qty))
    }

    /// Sum of line totals, without delivery.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Subtotal plus `delivery_charge`; an empty cart costs nothing.
    #[must_use]
    pub fn total(&self, delivery_charge: Price) -> Price {
        if self.is_empty() {
            Price::ZERO
        } else {
            self.subtotal() + delivery_charge
        }
    }

    /// Order lines for checkout.
    #[must_use]
    pub fn line_items(&self) -> Vec<LineItem> {
        self.items.iter().map(CartItem::to_line_item).collect()
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the cart from the session, empty if none is stored.
pub async fn load(session: &Session) -> Cart {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store the cart in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}
