//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! categories:
//!   - Dairy
//!   - Bakery
//! products:
//!   - name: Milk
//!     price: 30
//!     unit: litre
//!     category: Dairy
//!   - name: Bread
//!     price: 40
//!     category: Bakery
//!     status: Unavailable
//! ```
//!
//! Every entry is validated before anything is written. Products go through
//! the same path as the admin's add form, so each gets a server `createdAt`.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use zypso_admin::inventory;
use zypso_core::models::DEFAULT_UNIT;
use zypso_core::{NewProduct, Price, ProductStatus};
use zypso_firebase::DocumentStore;

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// One product entry.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: Option<ProductStatus>,
}

impl SeedProduct {
    fn to_new_product(&self) -> NewProduct {
        NewProduct {
            name: self.name.trim().to_string(),
            price: Price::new(self.price),
            unit: self
                .unit
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .unwrap_or(DEFAULT_UNIT)
                .to_string(),
            image_url: self.image_url.clone().unwrap_or_default(),
            category: self.category.trim().to_string(),
            status: self.status.unwrap_or(ProductStatus::Available),
        }
    }
}

/// Counts of written documents.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
}

/// Problems that would make the admin forms reject an entry.
#[must_use]
pub fn validate(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();

    for (i, name) in seed.categories.iter().enumerate() {
        if name.trim().is_empty() {
            errors.push(format!("categories[{i}]: name is empty"));
        }
    }
    for (i, product) in seed.products.iter().enumerate() {
        if product.name.trim().is_empty() {
            errors.push(format!("products[{i}]: name is empty"));
        }
        if product.price <= 0 {
            errors.push(format!(
                "products[{i}] ({}): price must be positive",
                product.name
            ));
        }
    }

    errors
}

/// Write every category, then every product.
///
/// # Errors
///
/// Stops at the first failed write. Earlier writes are kept.
pub async fn apply(
    store: &dyn DocumentStore,
    seed: &SeedFile,
) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let mut summary = SeedSummary::default();

    for name in &seed.categories {
        inventory::add_category(store, name).await?;
        summary.categories += 1;
    }
    for product in &seed.products {
        inventory::add_product(store, &product.to_new_product()).await?;
        summary.products += 1;
    }

    Ok(summary)
}

/// Seed from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails
/// validation, or a write fails.
pub async fn from_file(
    store: &dyn DocumentStore,
    file_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed file");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let summary = apply(store, &seed).await?;

    info!("Seeding complete!");
    info!("  Categories added: {}", summary.categories);
    info!("  Products added: {}", summary.products);

    Ok(())
}
