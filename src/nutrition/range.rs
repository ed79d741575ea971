//! Date-range nutrition aggregation
//!
//! Seeds one zeroed bucket per calendar day in the range, fetches the user's
//! meals once, and folds every food item into the bucket for its local day.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::source::{FetchError, MealRecordSource};
use crate::calendar::{end_of_day, start_of_day, strip_time, CalendarDate};
use crate::models::Macros;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Failed to fetch meals: {0}")]
    Fetch(#[from] FetchError),
}

/// Totals for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyNutrition {
    pub date: CalendarDate,
    #[serde(flatten)]
    pub totals: Macros,
    /// Number of food items folded in, not number of meals
    pub entries: u32,
}

impl DailyNutrition {
    fn empty(date: CalendarDate) -> Self {
        Self {
            date,
            totals: Macros::zero(),
            entries: 0,
        }
    }

    /// `yyyy-MM-dd` bucket key
    pub fn key(&self) -> String {
        self.date.iso_string()
    }
}

/// Per-day series plus range totals and integer averages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeStats {
    pub days: Vec<DailyNutrition>,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_fat: f64,
    pub total_carbs: f64,
    pub total_entries: u32,
    pub avg_calories: i64,
    pub avg_protein: i64,
    pub avg_fat: i64,
    pub avg_carbs: i64,
}

impl RangeStats {
    /// Summarise an ordered day series. Averages divide by the number of days
    /// (at least 1) and round half away from zero.
    pub fn from_days(days: Vec<DailyNutrition>) -> Self {
        let totals: Macros = days.iter().map(|d| d.totals).sum();
        let total_entries = days.iter().map(|d| d.entries).sum();
        let divisor = days.len().max(1) as f64;
        let avg = |total: f64| (total / divisor).round() as i64;

        Self {
            total_calories: totals.calories,
            total_protein: totals.protein,
            total_fat: totals.fat,
            total_carbs: totals.carbs,
            total_entries,
            avg_calories: avg(totals.calories),
            avg_protein: avg(totals.protein),
            avg_fat: avg(totals.fat),
            avg_carbs: avg(totals.carbs),
            days,
        }
    }

    pub fn totals(&self) -> Macros {
        Macros::new(
            self.total_calories,
            self.total_protein,
            self.total_fat,
            self.total_carbs,
        )
    }
}

/// Number of calendar days from `first` to `last` inclusive, never less than 1.
///
/// For a fixed offset this equals `ceil((end_of_day(last) - start_of_day(first)) / 86_400_000)`.
pub fn inclusive_day_count(first: CalendarDate, last: CalendarDate) -> u64 {
    u64::try_from(last.days_since(first) + 1).unwrap_or(0).max(1)
}

/// Aggregate a user's meals between `start` and `end` (whole days, inclusive).
///
/// Day boundaries and per-meal day keys are both computed in `start`'s
/// timezone. The store is queried exactly once; a failed fetch returns an
/// error and no partial stats. Meals whose local day falls outside the
/// seeded range are skipped.
pub async fn get_nutrition_range<Tz: TimeZone>(
    source: &dyn MealRecordSource,
    user_id: &str,
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
) -> Result<RangeStats, AggregateError> {
    let tz = start.timezone();
    let end = end.with_timezone(&tz);

    let first_day = strip_time(start);
    let last_day = strip_time(&end);
    let day_count = inclusive_day_count(first_day, last_day);

    let mut buckets: BTreeMap<CalendarDate, DailyNutrition> = (0..day_count)
        .map(|offset| {
            let date = first_day.add_days(offset);
            (date, DailyNutrition::empty(date))
        })
        .collect();

    let from = start_of_day(start).with_timezone(&Utc);
    let to = end_of_day(&end).with_timezone(&Utc);
    debug!(user_id, %from, %to, day_count, "Fetching meals for nutrition range");

    let records = source.fetch_meals(user_id, from, to).await.map_err(|e| {
        warn!(user_id, error = %e, "Meal fetch failed");
        e
    })?;

    let mut skipped = 0usize;
    for record in &records {
        let day = strip_time(&record.eaten_at.with_timezone(&tz));
        let Some(bucket) = buckets.get_mut(&day) else {
            debug!(meal_id = record.id, %day, "Meal outside seeded range, skipping");
            skipped += 1;
            continue;
        };

        for item in &record.food_items {
            bucket.totals += item.macros();
            bucket.entries += 1;
        }
    }

    debug!(
        user_id,
        meals = records.len(),
        skipped,
        "Aggregated nutrition range"
    );

    Ok(RangeStats::from_days(buckets.into_values().collect()))
}
