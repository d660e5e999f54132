//! The shop settings form.

use serde::Deserialize;

use zypso_core::collections::SHOP_CONTROL;
use zypso_core::{Price, SHOP_STATUS_DOCUMENT, SettingsUpdate, ShopSettings};
use zypso_firebase::{DocumentStore, StoreError, to_fields};

/// Message shown after a successful save.
pub const SETTINGS_SAVED: &str = "Settings Saved Successfully";

/// Submitted settings form. An unchecked checkbox sends nothing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub is_closed: Option<String>,
    #[serde(default)]
    pub delivery_charge: String,
    #[serde(default)]
    pub support_number: String,
}

impl SettingsForm {
    /// The merge payload. An unparseable delivery charge is saved as zero.
    #[must_use]
    pub fn to_update(&self) -> SettingsUpdate {
        SettingsUpdate {
            is_closed: self.is_closed.is_some(),
            delivery_charge: Price::parse_leading_integer(&self.delivery_charge)
                .unwrap_or(Price::ZERO),
            support_number: self.support_number.trim().to_string(),
        }
    }
}

/// Values pre-filled into the settings form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsView {
    pub is_closed: bool,
    pub delivery_charge: i64,
    pub support_number: String,
}

impl From<&ShopSettings> for SettingsView {
    fn from(settings: &ShopSettings) -> Self {
        Self {
            is_closed: settings.is_closed,
            delivery_charge: settings.delivery_charge.rupees(),
            support_number: settings.support_number_or_default().to_string(),
        }
    }
}

impl From<&SettingsUpdate> for SettingsView {
    fn from(update: &SettingsUpdate) -> Self {
        Self {
            is_closed: update.is_closed,
            delivery_charge: update.delivery_charge.rupees(),
            support_number: update.support_number.clone(),
        }
    }
}

/// Merge-write the settings document, creating it if needed.
///
/// # Errors
///
/// Returns `StoreError` when the write fails.
#[tracing::instrument(skip(store))]
pub async fn save(store: &dyn DocumentStore, update: &SettingsUpdate) -> Result<(), StoreError> {
    store
        .set_merge(SHOP_CONTROL, SHOP_STATUS_DOCUMENT, to_fields(update)?)
        .await?;
    tracing::info!(
        is_closed = update.is_closed,
        delivery_charge = %update.delivery_charge,
        "Shop settings saved"
    );
    Ok(())
}
