//! mealcal
//!
//! Meal logging store, month calendar grids, and date-range nutrition
//! aggregation for a nutrition tracker.

pub mod build_info;
pub mod calendar;
pub mod config;
pub mod db;
pub mod models;
pub mod nutrition;
