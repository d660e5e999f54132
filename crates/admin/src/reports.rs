//! Date-range filtering and sales aggregates over orders.
//!
//! Both the dashboard and `zypso-cli report` use these. Only orders whose
//! status is exactly `delivered` count towards revenue and units sold;
//! pending, cancelled and returned orders contribute zero.

use chrono::NaiveDate;
use serde::Deserialize;

use zypso_core::format::ShopClock;
use zypso_core::{Order, Price};

/// Wire format of the date inputs.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw `?start=&end=` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeQuery {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// An inclusive range of shop-local calendar days. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    #[must_use]
    pub const fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Read the range from query parameters. Empty or malformed dates leave
    /// that end open.
    #[must_use]
    pub fn from_query(query: &DateRangeQuery) -> Self {
        Self {
            start: query.start.as_deref().and_then(parse_date),
            end: query.end.as_deref().and_then(parse_date),
        }
    }

    /// Whether `order` falls inside the range: on or after 00:00:00 of the
    /// start day and on or before 23:59:59 of the end day, both on the
    /// shop clock.
    ///
    /// Orders still waiting for their server timestamp always pass.
    #[must_use]
    pub fn contains(&self, order: &Order, clock: &ShopClock) -> bool {
        let Some(created_at) = order.created_at else {
            return true;
        };
        if let Some(start) = self.start
            && created_at < clock.start_of_day(start)
        {
            return false;
        }
        if let Some(end) = self.end
            && created_at > clock.end_of_day(end)
        {
            return false;
        }
        true
    }

    /// The orders inside the range, in their original order.
    #[must_use]
    pub fn filter<'a>(&self, orders: &'a [Order], clock: &ShopClock) -> Vec<&'a Order> {
        orders
            .iter()
            .filter(|order| self.contains(order, clock))
            .collect()
    }

    /// Query string reproducing this range (`start=2024-05-01&end=`).
    #[must_use]
    pub fn query_string(&self) -> String {
        format!(
            "start={}&end={}",
            self.start_value(),
            self.end_value()
        )
    }

    /// Value for the start date input.
    #[must_use]
    pub fn start_value(&self) -> String {
        self.start
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// Value for the end date input.
    #[must_use]
    pub fn end_value(&self) -> String {
        self.end
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::debug!(value, error = %e, "Ignoring malformed date filter");
            None
        }
    }
}

/// Revenue and volume over a set of orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SalesSummary {
    /// Sum of `total` over delivered orders.
    pub revenue: Price,
    /// Sum of line-item quantities over delivered orders.
    pub units_sold: u64,
    /// Number of delivered orders.
    pub delivered: usize,
    /// Number of orders considered, whatever their status.
    pub orders: usize,
}

impl SalesSummary {
    /// Aggregate `orders`.
    #[must_use]
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        orders.into_iter().fold(Self::default(), |mut summary, order| {
            summary.orders += 1;
            if order.status.counts_as_sale() {
                summary.revenue += order.total;
                summary.units_sold += order.units();
                summary.delivered += 1;
            }
            summary
        })
    }
}
