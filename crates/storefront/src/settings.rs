//! Shop status as shown to customers.

use zypso_core::ShopSettings;
use zypso_core::format::ShopClock;

/// Closed overlay, support link and delivery charge for the page chrome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopStatusView {
    pub closed: bool,
    /// `Opening at: <time>` when a reopening time is set, else `Closed`.
    pub closed_message: String,
    pub support_number: String,
    pub delivery_charge: String,
}

impl ShopStatusView {
    #[must_use]
    pub fn new(settings: &ShopSettings, clock: &ShopClock) -> Self {
        let closed_message = settings.next_open_time.map_or_else(
            || "Closed".to_string(),
            |at| format!("Opening at: {}", clock.date_time(at)),
        );

        Self {
            closed: settings.is_closed,
            closed_message,
            support_number: settings.support_number_or_default().to_string(),
            delivery_charge: settings.delivery_charge.to_string(),
        }
    }

    /// `tel:` link for the support button.
    #[must_use]
    pub fn support_href(&self) -> String {
        format!("tel:{}", self.support_number)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use zypso_core::Price;

    #[test]
    fn test_closed_without_opening_time() {
        let settings = ShopSettings {
            is_closed: true,
            ..ShopSettings::default()
        };
        let view = ShopStatusView::new(&settings, &ShopClock::default());

        assert!(view.closed);
        assert_eq!(view.closed_message, "Closed");
        assert_eq!(view.support_href(), "tel:8090315246");
    }

    #[test]
    fn test_opening_time_in_shop_clock() {
        let settings = ShopSettings {
            is_closed: true,
            delivery_charge: Price::new(15),
            support_number: Some("9000000000".to_string()),
            next_open_time: Some(Utc.with_ymd_and_hms(2026, 10, 20, 3, 0, 0).unwrap()),
        };
        let view = ShopStatusView::new(&settings, &ShopClock::default());

        assert_eq!(view.closed_message, "Opening at: 20/10/2026, 08:30:00 AM");
        assert_eq!(view.support_href(), "tel:9000000000");
        assert_eq!(view.delivery_charge, "₹15");
    }
}
