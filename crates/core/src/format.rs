//! Shop-local time formatting.
//!
//! Timestamps are stored in UTC. The shop renders and filters them in a
//! single fixed offset (India Standard Time unless configured otherwise).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

/// Default shop offset from UTC, in minutes (UTC+05:30).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

/// Converts between stored UTC timestamps and the shop's wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopClock {
    offset: FixedOffset,
}

impl ShopClock {
    /// Create a clock for the given offset in minutes east of UTC.
    ///
    /// Offsets outside +/- 24h fall back to UTC.
    #[must_use]
    pub fn from_offset_minutes(minutes: i32) -> Self {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self { offset }
    }

    /// The configured offset.
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Convert a stored timestamp to shop-local time.
    #[must_use]
    pub fn local(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.offset)
    }

    /// `19/10/2026`
    #[must_use]
    pub fn date(&self, at: DateTime<Utc>) -> String {
        self.local(at).format("%d/%m/%Y").to_string()
    }

    /// `09:05 PM`
    #[must_use]
    pub fn time(&self, at: DateTime<Utc>) -> String {
        self.local(at).format("%I:%M %p").to_string()
    }

    /// `19/10/2026, 09:05:00 PM`
    #[must_use]
    pub fn date_time(&self, at: DateTime<Utc>) -> String {
        self.local(at).format("%d/%m/%Y, %I:%M:%S %p").to_string()
    }

    /// First instant of `date` on the shop clock (00:00:00).
    #[must_use]
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.at(date, NaiveTime::MIN)
    }

    /// Last whole second of `date` on the shop clock (23:59:59).
    #[must_use]
    pub fn end_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let end = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        self.at(date, end)
    }

    fn at(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        // A fixed offset has no gaps or folds, so the mapping is always single.
        self.offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .map_or_else(|| date.and_time(time).and_utc(), |dt| dt.with_timezone(&Utc))
    }
}

impl Default for ShopClock {
    fn default() -> Self {
        Self::from_offset_minutes(DEFAULT_UTC_OFFSET_MINUTES)
    }
}
