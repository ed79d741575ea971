//! Nutrition module
//!
//! Range aggregation over meal records, macro coercion, and energy conversion.

pub mod energy;
pub mod range;
pub mod source;

pub use energy::{
    grams_to_kcal_distribution, MacroKcal, CARBS_KCAL_PER_GRAM, FAT_KCAL_PER_GRAM,
    PROTEIN_KCAL_PER_GRAM,
};
pub use range::{get_nutrition_range, inclusive_day_count, AggregateError, DailyNutrition, RangeStats};
pub use source::{coerce_macro, FetchError, FoodItemEntry, MealRecord, MealRecordSource};
