//! Month-view date grid
//!
//! Builds the Sunday-first week matrix a month picker renders. The matrix
//! always starts on a Sunday and ends on a Saturday, padding with days from
//! the neighbouring months.

use chrono::{Months, Weekday};
use serde::Serialize;

use super::date::{strip_time, CalendarDate, StripTime};

pub const DAYS_PER_WEEK: usize = 7;

/// Seven consecutive dates, Sunday through Saturday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WeekRow([CalendarDate; DAYS_PER_WEEK]);

impl WeekRow {
    pub fn days(&self) -> &[CalendarDate; DAYS_PER_WEEK] {
        &self.0
    }

    pub fn sunday(&self) -> CalendarDate {
        self.0[0]
    }

    pub fn saturday(&self) -> CalendarDate {
        self.0[DAYS_PER_WEEK - 1]
    }

    pub fn contains(&self, date: CalendarDate) -> bool {
        self.0.contains(&date)
    }
}

/// A full month grid with its target year/month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthMatrix {
    pub year: i32,
    pub month: u32,
    weeks: Vec<WeekRow>,
}

impl MonthMatrix {
    pub fn weeks(&self) -> &[WeekRow] {
        &self.weeks
    }

    /// 4, 5 or 6 depending on how the month falls
    pub fn week_count(&self) -> usize {
        self.weeks.len()
    }

    /// Every cell in calendar order
    pub fn dates(&self) -> impl Iterator<Item = CalendarDate> + '_ {
        self.weeks.iter().flat_map(|w| w.days().iter().copied())
    }

    pub fn first(&self) -> Option<CalendarDate> {
        self.weeks.first().map(WeekRow::sunday)
    }

    pub fn last(&self) -> Option<CalendarDate> {
        self.weeks.last().map(WeekRow::saturday)
    }

    pub fn contains(&self, date: CalendarDate) -> bool {
        self.position(date).is_some()
    }

    /// `(row, column)` of a date in the grid
    pub fn position(&self, date: CalendarDate) -> Option<(usize, usize)> {
        let first = self.first()?;
        let offset = usize::try_from(date.days_since(first)).ok()?;
        if offset >= self.weeks.len() * DAYS_PER_WEEK {
            return None;
        }
        Some((offset / DAYS_PER_WEEK, offset % DAYS_PER_WEEK))
    }

    /// True for cells that belong to the target month rather than the padding
    pub fn is_in_month(&self, date: CalendarDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

/// Build the week matrix for the month containing `cursor`.
///
/// Only the cursor's year and month are used.
pub fn build_month_matrix<T: StripTime + ?Sized>(cursor: &T) -> MonthMatrix {
    let cursor = strip_time(cursor);
    let first = cursor.first_of_month();
    let last = cursor.last_of_month();

    let grid_start = first.sub_days(u64::from(first.weekday().num_days_from_sunday()));
    let grid_end = last.add_days(u64::from(
        Weekday::Sat.num_days_from_sunday() - last.weekday().num_days_from_sunday(),
    ));

    let total = usize::try_from(grid_end.days_since(grid_start) + 1).unwrap_or(0);
    let days: Vec<CalendarDate> = (0..total as u64).map(|i| grid_start.add_days(i)).collect();

    let weeks = days
        .chunks_exact(DAYS_PER_WEEK)
        .map(|chunk| {
            let mut row = [grid_start; DAYS_PER_WEEK];
            row.copy_from_slice(chunk);
            WeekRow(row)
        })
        .collect();

    MonthMatrix {
        year: first.year(),
        month: first.month(),
        weeks,
    }
}

/// Move a month cursor by `delta` months, clamping the day to the target
/// month's length (Jan 31 + 1 month = Feb 29 in a leap year).
pub fn shift_months(cursor: CalendarDate, delta: i32) -> CalendarDate {
    let naive = cursor.as_naive();
    let months = Months::new(delta.unsigned_abs());
    let shifted = if delta >= 0 {
        naive.checked_add_months(months)
    } else {
        naive.checked_sub_months(months)
    };
    shifted.map(CalendarDate::from).unwrap_or(cursor)
}

/// Clamp a selected date into `[min, max]` before matching it against grid cells
pub fn clamp_date(date: CalendarDate, min: CalendarDate, max: CalendarDate) -> CalendarDate {
    if min > max {
        return date;
    }
    date.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> CalendarDate {
        CalendarDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_february_2024_leap_year() {
        let matrix = build_month_matrix(&date(2024, 2, 1));
        assert_eq!(matrix.week_count(), 5);
        assert_eq!(matrix.first(), Some(date(2024, 1, 28)));
        assert_eq!(matrix.last(), Some(date(2024, 3, 2)));
        assert_eq!((matrix.year, matrix.month), (2024, 2));
    }

    #[test]
    fn test_four_week_month() {
        // Feb 2015 starts on a Sunday and has 28 days
        let matrix = build_month_matrix(&date(2015, 2, 10));
        assert_eq!(matrix.week_count(), 4);
        assert_eq!(matrix.first(), Some(date(2015, 2, 1)));
        assert_eq!(matrix.last(), Some(date(2015, 2, 28)));
    }

    #[test]
    fn test_six_week_month() {
        // Dec 2023 starts on a Friday and has 31 days
        let matrix = build_month_matrix(&date(2023, 12, 31));
        assert_eq!(matrix.week_count(), 6);
        assert_eq!(matrix.first(), Some(date(2023, 11, 26)));
        assert_eq!(matrix.last(), Some(date(2024, 1, 6)));
    }

    #[test]
    fn test_cursor_day_and_time_are_ignored() {
        let from_first = build_month_matrix(&date(2024, 2, 1));
        let from_datetime = build_month_matrix(&Utc.with_ymd_and_hms(2024, 2, 29, 23, 0, 0).unwrap());
        assert_eq!(from_first, from_datetime);
    }

    #[test]
    fn test_grid_shape_for_every_month() {
        for year in 1995..=2030 {
            for month in 1..=12 {
                let cursor = NaiveDate::from_ymd_opt(year, month, 15).unwrap();
                let matrix = build_month_matrix(&cursor);

                assert!((4..=6).contains(&matrix.week_count()), "{year}-{month}");
                let cells: Vec<_> = matrix.dates().collect();
                assert_eq!(cells.len() % DAYS_PER_WEEK, 0);
                assert_eq!(cells.first().unwrap().weekday(), Weekday::Sun);
                assert_eq!(cells.last().unwrap().weekday(), Weekday::Sat);

                for pair in cells.windows(2) {
                    assert_eq!(pair[1].days_since(pair[0]), 1, "gap in {year}-{month}");
                }

                let unique: HashSet<_> = cells.iter().collect();
                assert_eq!(unique.len(), cells.len());

                let in_month = cells.iter().filter(|d| matrix.is_in_month(**d)).count();
                assert_eq!(Some(in_month as u32), crate::calendar::days_in_month(year, month));

                for row in matrix.weeks() {
                    assert_eq!(row.sunday().weekday(), Weekday::Sun);
                }
            }
        }
    }

    #[test]
    fn test_position_lookup() {
        let matrix = build_month_matrix(&date(2024, 2, 1));
        assert_eq!(matrix.position(date(2024, 1, 28)), Some((0, 0)));
        assert_eq!(matrix.position(date(2024, 2, 1)), Some((0, 4)));
        assert_eq!(matrix.position(date(2024, 3, 2)), Some((4, 6)));
        assert_eq!(matrix.position(date(2024, 3, 3)), None);
        assert_eq!(matrix.position(date(2024, 1, 27)), None);
        assert!(matrix.contains(date(2024, 2, 29)));
        assert!(!matrix.is_in_month(date(2024, 1, 31)));
    }

    #[test]
    fn test_shift_months_clamps_day() {
        assert_eq!(shift_months(date(2024, 1, 31), 1), date(2024, 2, 29));
        assert_eq!(shift_months(date(2024, 3, 31), -1), date(2024, 2, 29));
        assert_eq!(shift_months(date(2024, 1, 15), -1), date(2023, 12, 15));
        assert_eq!(shift_months(date(2024, 5, 5), 0), date(2024, 5, 5));
    }

    #[test]
    fn test_clamp_date() {
        let min = date(2024, 2, 10);
        let max = date(2024, 2, 20);
        assert_eq!(clamp_date(date(2024, 2, 1), min, max), min);
        assert_eq!(clamp_date(date(2024, 2, 25), min, max), max);
        assert_eq!(clamp_date(date(2024, 2, 15), min, max), date(2024, 2, 15));
        assert_eq!(clamp_date(date(2024, 2, 15), max, min), date(2024, 2, 15));
    }
}
