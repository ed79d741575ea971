//! Data models
//!
//! Rust structs representing database entities.

mod macros;
pub mod meal;
mod meal_item;
mod meal_type;

pub use macros::Macros;
pub use meal::{format_timestamp, parse_timestamp, Meal, MealCreate, MealDetail, MealUpdate};
pub use meal_item::{MealItem, MealItemCreate, MealItemUpdate};
pub use meal_type::MealType;
