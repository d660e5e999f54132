//! Catalog products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::serde_helpers;
use crate::types::{Price, ProductId, ProductStatus};

/// Image shown when a product has no image reference.
pub const PLACEHOLDER_IMAGE: &str = "placeholder.png";

/// A product as read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(
        default = "serde_helpers::default_unit",
        deserialize_with = "serde_helpers::unit"
    )]
    pub unit: String,
    /// Category name.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default, deserialize_with = "serde_helpers::non_empty")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Image reference to render, falling back to the placeholder.
    #[must_use]
    pub fn image_or_placeholder(&self) -> &str {
        self.image_url.as_deref().unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// Whether the product can be added to a cart.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.status.is_purchasable()
    }
}

/// Payload for adding a product. `createdAt` is assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub unit: String,
    pub image_url: String,
    pub category: String,
    pub status: ProductStatus,
}

/// Fields written by the product edit form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductEdit {
    pub name: String,
    pub price: Price,
    pub unit: String,
    pub image_url: String,
}

/// Stock toggle payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockUpdate {
    pub status: ProductStatus,
}
