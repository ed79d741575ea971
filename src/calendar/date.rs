//! Day-granularity dates
//!
//! `CalendarDate` is the value every grid cell and every aggregation bucket
//! is keyed by. Anything date-like can be reduced to one with [`strip_time`].

use std::fmt;

use chrono::{
    DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday,
};
use serde::{Deserialize, Serialize};

/// ISO date format used for bucket keys and display
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// 23:59:59.999, checked at compile time
const LAST_MILLI_OF_DAY: NaiveTime = match NaiveTime::from_hms_milli_opt(23, 59, 59, 999) {
    Some(t) => t,
    None => panic!("invalid end-of-day time"),
};

/// A date with time-of-day and timezone removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn from_ymd_opt(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse a `yyyy-MM-dd` string
    pub fn parse_iso(s: &str) -> Result<Self, chrono::ParseError> {
        NaiveDate::parse_from_str(s.trim(), ISO_DATE_FORMAT).map(Self)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// The `yyyy-MM-dd` key used by daily aggregation
    pub fn iso_string(&self) -> String {
        self.0.format(ISO_DATE_FORMAT).to_string()
    }

    pub fn add_days(self, days: u64) -> Self {
        Self(self.0 + Days::new(days))
    }

    pub fn sub_days(self, days: u64) -> Self {
        Self(self.0 - Days::new(days))
    }

    /// Days elapsed from `earlier` to `self`; negative when `earlier` is later
    pub fn days_since(&self, earlier: CalendarDate) -> i64 {
        self.0.signed_duration_since(earlier.0).num_days()
    }

    /// First day of this date's month
    pub fn first_of_month(&self) -> Self {
        self.sub_days(u64::from(self.0.day0()))
    }

    /// Last day of this date's month
    pub fn last_of_month(&self) -> Self {
        let first = self.first_of_month().0;
        match first.checked_add_months(Months::new(1)) {
            Some(next_first) => Self(next_first - Days::new(1)),
            // Only the last representable month has no successor
            None => Self(NaiveDate::MAX),
        }
    }

    /// Midnight at the start of this day, in `tz`
    pub fn start_in<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz> {
        local_or_utc(tz, self.0.and_time(NaiveTime::MIN), true)
    }

    /// Last millisecond of this day (23:59:59.999), in `tz`
    pub fn end_in<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz> {
        local_or_utc(tz, self.0.and_time(LAST_MILLI_OF_DAY), false)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(ISO_DATE_FORMAT))
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl From<CalendarDate> for NaiveDate {
    fn from(date: CalendarDate) -> Self {
        date.0
    }
}

/// Anything that can be truncated to a calendar day
pub trait StripTime {
    fn strip_time(&self) -> CalendarDate;
}

impl StripTime for CalendarDate {
    fn strip_time(&self) -> CalendarDate {
        *self
    }
}

impl StripTime for NaiveDate {
    fn strip_time(&self) -> CalendarDate {
        CalendarDate(*self)
    }
}

impl StripTime for NaiveDateTime {
    fn strip_time(&self) -> CalendarDate {
        CalendarDate(self.date())
    }
}

/// Strips in the value's own timezone, so 23:30 at -05:00 stays on its local day.
impl<Tz: TimeZone> StripTime for DateTime<Tz> {
    fn strip_time(&self) -> CalendarDate {
        CalendarDate(self.date_naive())
    }
}

/// Remove sub-day precision, keeping only year/month/day.
///
/// Idempotent: `strip_time(&strip_time(d)) == strip_time(d)`.
pub fn strip_time<T: StripTime + ?Sized>(value: &T) -> CalendarDate {
    value.strip_time()
}

/// 00:00:00.000 of the local calendar day containing `dt`
pub fn start_of_day<Tz: TimeZone>(dt: &DateTime<Tz>) -> DateTime<Tz> {
    strip_time(dt).start_in(&dt.timezone())
}

/// 23:59:59.999 of the local calendar day containing `dt`
pub fn end_of_day<Tz: TimeZone>(dt: &DateTime<Tz>) -> DateTime<Tz> {
    strip_time(dt).end_in(&dt.timezone())
}

/// Length of a month; `None` for a month outside 1..=12
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    CalendarDate::from_ymd_opt(year, month, 1).map(|first| first.last_of_month().day())
}

// A local time can be skipped (DST gap) or repeated (DST overlap). Overlaps
// resolve toward the widest day; gaps fall back to reading the wall time as UTC.
fn local_or_utc<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime, earliest: bool) -> DateTime<Tz> {
    let local = tz.from_local_datetime(&naive);
    let resolved = if earliest { local.earliest() } else { local.latest() };
    resolved.unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike, Utc};

    fn date(y: i32, m: u32, d: u32) -> CalendarDate {
        CalendarDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_strip_time_drops_time_of_day() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(18, 45, 12)
            .unwrap();
        assert_eq!(strip_time(&dt), date(2024, 3, 15));
    }

    #[test]
    fn test_strip_time_is_idempotent() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let samples = [
            Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap().fixed_offset(),
            offset.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap(),
            offset.with_ymd_and_hms(2024, 7, 4, 12, 30, 0).unwrap(),
        ];
        for d in samples {
            let once = strip_time(&d);
            assert_eq!(strip_time(&once), once);
        }
    }

    #[test]
    fn test_strip_time_uses_value_timezone() {
        // 03:30 UTC on the 16th is still the 15th at -05:00
        let utc = Utc.with_ymd_and_hms(2024, 3, 16, 3, 30, 0).unwrap();
        let local = utc.with_timezone(&FixedOffset::west_opt(5 * 3600).unwrap());
        assert_eq!(strip_time(&utc), date(2024, 3, 16));
        assert_eq!(strip_time(&local), date(2024, 3, 15));
    }

    #[test]
    fn test_equality_ignores_time() {
        let morning = Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 1, 1, 22, 0, 0).unwrap();
        assert_eq!(strip_time(&morning), strip_time(&night));
    }

    #[test]
    fn test_day_bounds() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let dt = offset.with_ymd_and_hms(2024, 3, 15, 14, 20, 0).unwrap();

        let start = start_of_day(&dt);
        assert_eq!(start.date_naive(), dt.date_naive());
        assert_eq!((start.hour(), start.minute(), start.second()), (0, 0, 0));

        let end = end_of_day(&dt);
        assert_eq!(end.date_naive(), dt.date_naive());
        assert_eq!((end.hour(), end.minute(), end.second()), (23, 59, 59));
        assert_eq!(end.timestamp_subsec_millis(), 999);
        assert_eq!((end - start).num_milliseconds(), 86_400_000 - 1);
    }

    #[test]
    fn test_end_of_day_meets_next_start() {
        let end = date(2023, 12, 31).end_in(&Utc);
        let next = date(2024, 1, 1).start_in(&Utc);
        assert_eq!(end.time(), NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap());
        assert_eq!((next - end).num_milliseconds(), 1);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(1900, 2), Some(28));
        assert_eq!(days_in_month(2000, 2), Some(29));
        assert_eq!(days_in_month(2024, 4), Some(30));
        assert_eq!(days_in_month(2024, 12), Some(31));
        assert_eq!(days_in_month(2024, 13), None);
        assert_eq!(days_in_month(2024, 0), None);
    }

    #[test]
    fn test_month_edges() {
        let d = date(2024, 2, 17);
        assert_eq!(d.first_of_month(), date(2024, 2, 1));
        assert_eq!(d.last_of_month(), date(2024, 2, 29));
        assert_eq!(date(2023, 12, 5).last_of_month(), date(2023, 12, 31));
        assert_eq!(date(2023, 2, 28).last_of_month(), date(2023, 2, 28));
        assert_eq!(date(2024, 4, 1).last_of_month(), date(2024, 4, 30));

        let max = CalendarDate::from(NaiveDate::MAX);
        assert_eq!(max.first_of_month().last_of_month(), max);
    }

    #[test]
    fn test_iso_round_trip_and_display() {
        let d = CalendarDate::parse_iso("2024-03-15").unwrap();
        assert_eq!(d.iso_string(), "2024-03-15");
        assert_eq!(d.to_string(), "2024-03-15");
        assert!(CalendarDate::parse_iso("15/03/2024").is_err());
    }

    #[test]
    fn test_serializes_as_iso_string() {
        let json = serde_json::to_string(&date(2024, 1, 28)).unwrap();
        assert_eq!(json, "\"2024-01-28\"");
    }
}
