//! The singleton shop settings document (`shopControl/status`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::serde_helpers;
use crate::types::Price;

/// Document ID of the settings singleton inside `shopControl`.
pub const SHOP_STATUS_DOCUMENT: &str = "status";

/// Support number used when none has been saved.
pub const DEFAULT_SUPPORT_NUMBER: &str = "8090315246";

/// Shop-wide settings as read from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSettings {
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub delivery_charge: Price,
    #[serde(default, deserialize_with = "serde_helpers::non_empty")]
    pub support_number: Option<String>,
    #[serde(default)]
    pub next_open_time: Option<DateTime<Utc>>,
}

impl ShopSettings {
    /// Support number, or the shop default when unset.
    #[must_use]
    pub fn support_number_or_default(&self) -> &str {
        self.support_number
            .as_deref()
            .unwrap_or(DEFAULT_SUPPORT_NUMBER)
    }
}

/// The fields the admin settings form merge-writes.
///
/// `nextOpenTime` is not a form field and survives every save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub is_closed: bool,
    pub delivery_charge: Price,
    pub support_number: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_settings_defaults() {
        let settings: ShopSettings = serde_json::from_value(json!({ "id": "status" })).unwrap();
        assert!(!settings.is_closed);
        assert_eq!(settings.delivery_charge, Price::ZERO);
        assert_eq!(settings.support_number_or_default(), "8090315246");
        assert!(settings.next_open_time.is_none());
    }

    #[test]
    fn test_settings_update_has_only_form_fields() {
        let update = SettingsUpdate {
            is_closed: true,
            delivery_charge: Price::new(25),
            support_number: "123".to_owned(),
        };
        let value = serde_json::to_value(&update).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["deliveryCharge", "isClosed", "supportNumber"]);
    }
}
