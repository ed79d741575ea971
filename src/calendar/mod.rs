//! Calendar module
//!
//! Day-granularity dates and the month-view week grid.

pub mod date;
pub mod grid;

pub use date::{
    days_in_month, end_of_day, start_of_day, strip_time, CalendarDate, StripTime,
    ISO_DATE_FORMAT,
};
pub use grid::{build_month_matrix, clamp_date, shift_months, MonthMatrix, WeekRow, DAYS_PER_WEEK};
