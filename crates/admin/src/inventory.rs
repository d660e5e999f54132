//! Product and category writes.

use serde::Deserialize;
use thiserror::Error;

use zypso_core::collections::{CATEGORIES, CREATED_AT, PRODUCTS};
use zypso_core::models::DEFAULT_UNIT;
use zypso_core::{
    CategoryId, NewCategory, NewProduct, Price, ProductEdit, ProductId, ProductStatus, StockUpdate,
};
use zypso_firebase::{DocumentStore, StoreError, to_fields};

/// Message shown after a product is created.
pub const PRODUCT_ADDED: &str = "Product Added";

/// Why an inventory change was not made. `Display` is shown to the admin.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Product name and a price are required")]
    MissingProductFields,

    #[error("Price must be a whole number")]
    InvalidPrice,

    #[error("Category name is required")]
    MissingCategoryName,

    #[error("Error: {0}")]
    Store(#[from] StoreError),
}

/// The add-product form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category: String,
}

impl NewProductForm {
    /// Check the form and build the product to write.
    ///
    /// # Errors
    ///
    /// Returns `MissingProductFields` for a blank name or a price that is
    /// missing, zero or negative.
    pub fn validate(&self) -> Result<NewProduct, InventoryError> {
        let name = self.name.trim();
        let price = Price::parse_leading_integer(&self.price)
            .ok()
            .filter(|price| price.rupees() > 0);

        match price {
            Some(price) if !name.is_empty() => Ok(NewProduct {
                name: name.to_string(),
                price,
                unit: unit_or_default(&self.unit),
                image_url: self.image_url.trim().to_string(),
                category: self.category.trim().to_string(),
                status: ProductStatus::Available,
            }),
            _ => Err(InventoryError::MissingProductFields),
        }
    }
}

/// The edit-product form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductEditForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub image_url: String,
}

impl ProductEditForm {
    /// Check the form and build the update.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPrice` when the price has no leading integer.
    pub fn validate(&self) -> Result<ProductEdit, InventoryError> {
        let price =
            Price::parse_leading_integer(&self.price).map_err(|_| InventoryError::InvalidPrice)?;
        Ok(ProductEdit {
            name: self.name.trim().to_string(),
            price,
            unit: unit_or_default(&self.unit),
            image_url: self.image_url.trim().to_string(),
        })
    }
}

fn unit_or_default(unit: &str) -> String {
    let unit = unit.trim();
    if unit.is_empty() {
        DEFAULT_UNIT.to_string()
    } else {
        unit.to_string()
    }
}

/// Create a product, stamped with the server's time.
///
/// # Errors
///
/// Returns `StoreError` when the write fails.
#[tracing::instrument(skip(store, product), fields(name = %product.name))]
pub async fn add_product(
    store: &dyn DocumentStore,
    product: &NewProduct,
) -> Result<ProductId, StoreError> {
    let id = store
        .add(PRODUCTS, to_fields(product)?, &[CREATED_AT])
        .await?;
    tracing::info!(product_id = %id, "Product added");
    Ok(ProductId::new(id))
}

/// Overwrite a product's name, price, unit and image.
///
/// # Errors
///
/// Returns `StoreError` when the product does not exist or the write fails.
#[tracing::instrument(skip(store, edit))]
pub async fn update_product(
    store: &dyn DocumentStore,
    id: &ProductId,
    edit: &ProductEdit,
) -> Result<(), StoreError> {
    store.update(PRODUCTS, id.as_str(), to_fields(edit)?).await?;
    tracing::info!(product_id = %id, "Product updated");
    Ok(())
}

/// Mark a product available or unavailable.
///
/// # Errors
///
/// Returns `StoreError` when the product does not exist or the write fails.
#[tracing::instrument(skip(store))]
pub async fn set_stock(
    store: &dyn DocumentStore,
    id: &ProductId,
    status: ProductStatus,
) -> Result<(), StoreError> {
    store
        .update(PRODUCTS, id.as_str(), to_fields(&StockUpdate { status })?)
        .await?;
    tracing::info!(product_id = %id, status = %status, "Stock updated");
    Ok(())
}

/// Delete a product. Past orders keep their line-item snapshots.
///
/// # Errors
///
/// Returns `StoreError` when the delete fails.
#[tracing::instrument(skip(store))]
pub async fn delete_product(store: &dyn DocumentStore, id: &ProductId) -> Result<(), StoreError> {
    store.delete(PRODUCTS, id.as_str()).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(())
}

/// Create a category.
///
/// # Errors
///
/// Returns `MissingCategoryName` for a blank name and `Store` when the
/// write fails.
#[tracing::instrument(skip(store))]
pub async fn add_category(
    store: &dyn DocumentStore,
    name: &str,
) -> Result<CategoryId, InventoryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(InventoryError::MissingCategoryName);
    }

    let id = store
        .add(
            CATEGORIES,
            to_fields(&NewCategory {
                name: name.to_string(),
            })?,
            &[],
        )
        .await?;
    tracing::info!(category_id = %id, "Category added");
    Ok(CategoryId::new(id))
}

/// Delete a category. Products keep their category name.
///
/// # Errors
///
/// Returns `StoreError` when the delete fails.
#[tracing::instrument(skip(store))]
pub async fn delete_category(store: &dyn DocumentStore, id: &CategoryId) -> Result<(), StoreError> {
    store.delete(CATEGORIES, id.as_str()).await?;
    tracing::info!(category_id = %id, "Category deleted");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use zypso_firebase::MemoryBackend;

    fn form(name: &str, price: &str) -> NewProductForm {
        NewProductForm {
            name: name.to_string(),
            price: price.to_string(),
            unit: String::new(),
            image_url: String::new(),
            category: "Dairy".to_string(),
        }
    }

    #[test]
    fn test_new_product_requires_name_and_positive_price() {
        assert!(form("Milk", "30").validate().is_ok());
        for (name, price) in [("", "30"), ("  ", "30"), ("Milk", ""), ("Milk", "0"), ("Milk", "-5"), ("Milk", "abc")] {
            assert!(
                matches!(form(name, price).validate(), Err(InventoryError::MissingProductFields)),
                "{name:?} / {price:?}"
            );
        }
    }

    #[test]
    fn test_new_product_defaults() {
        let product = form(" Milk ", "30.75").validate().unwrap();
        assert_eq!(product.name, "Milk");
        assert_eq!(product.price, Price::new(30));
        assert_eq!(product.unit, "piece");
        assert_eq!(product.status, ProductStatus::Available);
    }

    #[test]
    fn test_edit_rejects_non_numeric_price() {
        let edit = ProductEditForm {
            name: "Milk".to_string(),
            price: "abc".to_string(),
            ..ProductEditForm::default()
        };
        assert!(matches!(edit.validate(), Err(InventoryError::InvalidPrice)));
    }

    #[tokio::test]
    async fn test_add_product_stamps_created_at() {
        let backend = MemoryBackend::new();
        let product = form("Milk", "30").validate().unwrap();

        let id = add_product(&backend, &product).await.unwrap();
        let stored = backend.get(PRODUCTS, id.as_str()).unwrap();
        assert_eq!(stored["status"], "Available");
        assert_eq!(stored["price"], 30);
        assert!(stored.contains_key("createdAt"));
    }

    #[tokio::test]
    async fn test_stock_toggle_and_delete() {
        let backend = MemoryBackend::new();
        backend.put(
            PRODUCTS,
            "p1",
            json!({"name": "Milk", "price": 30, "status": "Available"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let id = ProductId::new("p1");

        set_stock(&backend, &id, ProductStatus::Unavailable).await.unwrap();
        assert_eq!(backend.get(PRODUCTS, "p1").unwrap()["status"], "Unavailable");

        delete_product(&backend, &id).await.unwrap();
        assert!(backend.get(PRODUCTS, "p1").is_none());
    }

    #[tokio::test]
    async fn test_blank_category_is_not_written() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            add_category(&backend, "   ").await,
            Err(InventoryError::MissingCategoryName)
        ));

        let id = add_category(&backend, "Bakery").await.unwrap();
        assert_eq!(backend.get(CATEGORIES, id.as_str()).unwrap()["name"], "Bakery");
    }
}
