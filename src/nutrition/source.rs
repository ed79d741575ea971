//! Meal record source
//!
//! The aggregator reads meals through [`MealRecordSource`] so any store with
//! a user filter and an inclusive time-range filter can back it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::db::DbError;
use crate::models::Macros;

/// Errors raised while fetching meal records
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Store task failed: {0}")]
    Task(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// One food item inside a fetched meal.
///
/// Macro fields are kept loosely typed; see [`coerce_macro`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodItemEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub calories: Value,
    #[serde(default)]
    pub protein: Value,
    #[serde(default)]
    pub fat: Value,
    #[serde(default)]
    pub carbs: Value,
}

impl FoodItemEntry {
    /// Coerced macro amounts
    pub fn macros(&self) -> Macros {
        Macros {
            calories: coerce_macro(&self.calories),
            protein: coerce_macro(&self.protein),
            fat: coerce_macro(&self.fat),
            carbs: coerce_macro(&self.carbs),
        }
    }
}

/// A meal as returned by a record source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    pub id: i64,
    pub user_id: String,
    pub eaten_at: DateTime<Utc>,
    #[serde(default)]
    pub food_items: Vec<FoodItemEntry>,
}

/// Filter-and-fetch access to meals
#[async_trait]
pub trait MealRecordSource: Send + Sync {
    /// All meals for `user_id` with `from <= eaten_at <= to`
    async fn fetch_meals(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MealRecord>, FetchError>;
}

/// Read a macro field as a finite, non-negative number.
///
/// Numbers and numeric strings are accepted. Null, missing, non-numeric,
/// non-finite and negative values are 0.
pub fn coerce_macro(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0)
}
