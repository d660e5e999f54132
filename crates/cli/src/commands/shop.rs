//! Open and close the shop.
//!
//! Both write only `isClosed` and `nextOpenTime`; the delivery charge and
//! support number stay as the admin left them.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};
use tracing::info;

use zypso_core::SHOP_STATUS_DOCUMENT;
use zypso_core::collections::SHOP_CONTROL;
use zypso_firebase::{DocumentStore, Fields, StoreError};

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

/// Reopen the shop and clear the next opening time.
///
/// # Errors
///
/// Returns `StoreError` if the write fails.
pub async fn open(store: &dyn DocumentStore) -> Result<(), StoreError> {
    store
        .set_merge(
            SHOP_CONTROL,
            SHOP_STATUS_DOCUMENT,
            fields(json!({ "isClosed": false, "nextOpenTime": null })),
        )
        .await?;
    info!("Shop opened");
    Ok(())
}

/// Close the shop, optionally announcing when it reopens.
///
/// Without `next_open` any previously announced time is kept.
///
/// # Errors
///
/// Returns `StoreError` if the write fails.
pub async fn close(
    store: &dyn DocumentStore,
    next_open: Option<DateTime<Utc>>,
) -> Result<(), StoreError> {
    let mut data = fields(json!({ "isClosed": true }));
    if let Some(at) = next_open {
        data.insert(
            "nextOpenTime".to_string(),
            Value::String(at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
    }

    store
        .set_merge(SHOP_CONTROL, SHOP_STATUS_DOCUMENT, data)
        .await?;
    info!(?next_open, "Shop closed");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use zypso_core::{Price, ShopSettings};
    use zypso_firebase::MemoryBackend;

    #[tokio::test]
    async fn test_close_then_open_keeps_other_settings() {
        let backend = MemoryBackend::new();
        backend.put(
            SHOP_CONTROL,
            SHOP_STATUS_DOCUMENT,
            fields(json!({ "deliveryCharge": 20, "supportNumber": "999" })),
        );

        let at = Utc.with_ymd_and_hms(2024, 5, 2, 3, 30, 0).unwrap();
        close(&backend, Some(at)).await.unwrap();

        let stored = backend.get(SHOP_CONTROL, SHOP_STATUS_DOCUMENT).unwrap();
        let settings: ShopSettings = serde_json::from_value(Value::Object(stored)).unwrap();
        assert!(settings.is_closed);
        assert_eq!(settings.next_open_time, Some(at));
        assert_eq!(settings.delivery_charge, Price::new(20));

        open(&backend).await.unwrap();
        let stored = backend.get(SHOP_CONTROL, SHOP_STATUS_DOCUMENT).unwrap();
        let settings: ShopSettings = serde_json::from_value(Value::Object(stored)).unwrap();
        assert!(!settings.is_closed);
        assert!(settings.next_open_time.is_none());
        assert_eq!(settings.support_number.as_deref(), Some("999"));
    }
}
