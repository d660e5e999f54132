//! Order placement.

use serde::Deserialize;
use thiserror::Error;

use zypso_core::collections::{CREATED_AT, ORDERS};
use zypso_core::{NewOrder, OrderId, OrderStatus, Price};
use zypso_firebase::{DocumentStore, StoreError, to_fields};

use crate::cart::Cart;
use crate::models::CurrentCustomer;

/// Delivery details from the cart sidebar.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

impl CheckoutForm {
    /// Whether every delivery field has non-whitespace content.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.phone, &self.address]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// Why an order was not placed. `Display` is the message shown to the
/// customer.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Please login to place an order")]
    NotSignedIn,

    #[error("Please fill all delivery details")]
    MissingDetails,

    #[error("Error: {0}")]
    Store(#[from] StoreError),
}

/// Message shown after a successful checkout.
pub const ORDER_PLACED: &str = "Order Placed Successfully!";

/// Write one pending order for `cart`.
///
/// The total is recomputed from the cart lines plus `delivery_charge`.
/// Validation failures perform no write. The caller clears the cart only
/// on success.
///
/// # Errors
///
/// Returns `NotSignedIn` without a customer, `MissingDetails` for a blank
/// field or an empty cart, and `Store` when the write fails.
#[tracing::instrument(skip_all, fields(items = cart.items().len()))]
pub async fn place_order(
    store: &dyn DocumentStore,
    customer: Option<&CurrentCustomer>,
    form: &CheckoutForm,
    cart: &Cart,
    delivery_charge: Price,
) -> Result<OrderId, CheckoutError> {
    let customer = customer.ok_or(CheckoutError::NotSignedIn)?;
    if !form.is_complete() || cart.is_empty() {
        return Err(CheckoutError::MissingDetails);
    }

    let order = NewOrder {
        user_id: customer.uid.clone(),
        customer_name: form.name.trim().to_string(),
        customer_phone: form.phone.trim().to_string(),
        customer_address: form.address.trim().to_string(),
        items: cart.line_items(),
        total: cart.total(delivery_charge),
        status: OrderStatus::Pending,
    };

    let id = store
        .with_token(&customer.id_token())
        .add(ORDERS, to_fields(&order)?, &[CREATED_AT])
        .await?;

    tracing::info!(order_id = %id, uid = %customer.uid, total = %order.total, "Order placed");
    Ok(OrderId::new(id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use secrecy::SecretString;
    use zypso_core::{Product, ProductId, ProductStatus};
    use zypso_firebase::{AuthSession, MemoryBackend};

    fn customer() -> CurrentCustomer {
        CurrentCustomer::from(&AuthSession {
            uid: "u1".to_string(),
            email: "asha@example.com".to_string(),
            id_token: SecretString::from("token"),
            refresh_token: SecretString::from("refresh"),
            expires_at: Utc::now() + Duration::hours(1),
        })
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            name: "Asha".to_string(),
            phone: "9999999999".to_string(),
            address: "12 MG Road".to_string(),
        }
    }

    fn cart() -> Cart {
        let mut cart = Cart::default();
        let product = Product {
            id: ProductId::new("p1"),
            name: "Ghee".to_string(),
            price: Price::new(100),
            unit: "jar".to_string(),
            category: "Dairy".to_string(),
            status: ProductStatus::Available,
            image_url: None,
            created_at: None,
        };
        cart.add(&product);
        cart.add(&product);
        cart
    }

    #[tokio::test]
    async fn test_places_pending_order_with_recomputed_total() {
        let backend = MemoryBackend::new();
        let id = place_order(&backend, Some(&customer()), &form(), &cart(), Price::new(20))
            .await
            .unwrap();

        let stored = backend.get(ORDERS, id.as_str()).unwrap();
        assert_eq!(stored["total"], 220);
        assert_eq!(stored["status"], "pending");
        assert_eq!(stored["userId"], "u1");
        assert_eq!(stored["items"][0]["qty"], 2);
        assert!(stored.contains_key("createdAt"));
    }

    #[tokio::test]
    async fn test_requires_sign_in() {
        let backend = MemoryBackend::new();
        let err = place_order(&backend, None, &form(), &cart(), Price::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please login to place an order");
    }

    #[tokio::test]
    async fn test_blank_details_or_empty_cart_write_nothing() {
        let backend = MemoryBackend::new();
        let blank = CheckoutForm {
            address: "   ".to_string(),
            ..form()
        };

        let err = place_order(&backend, Some(&customer()), &blank, &cart(), Price::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please fill all delivery details");

        let err = place_order(&backend, Some(&customer()), &form(), &Cart::default(), Price::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::MissingDetails));

        let orders = backend.query(ORDERS, &zypso_firebase::Query::all()).await.unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_surfaces_service_message() {
        let backend = MemoryBackend::new();
        backend.fail_next_write("The service is currently unavailable.");

        let err = place_order(&backend, Some(&customer()), &form(), &cart(), Price::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Error: The service is currently unavailable.");
    }
}
