//! SQLite meal record store
//!
//! Serves [`MealRecordSource`] from the `meals` and `meal_item_components`
//! tables. Queries run on the blocking pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::params;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use tracing::debug;

use super::{Database, DbResult};
use crate::models::meal::{eaten_at_from_row, format_timestamp};
use crate::nutrition::{FetchError, FoodItemEntry, MealRecord, MealRecordSource};

/// Convert a raw SQLite value into the loosely typed form macro fields use
pub(crate) fn sql_value_to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null | SqlValue::Blob(_) => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        SqlValue::Text(s) => Value::String(s),
    }
}

#[derive(Clone)]
pub struct SqliteMealStore {
    database: Database,
}

impl SqliteMealStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Blocking version of [`MealRecordSource::fetch_meals`]
    pub fn fetch_meals_blocking(
        &self,
        user_id: &str,
        from: &DateTime<Utc>,
        to: &DateTime<Utc>,
    ) -> DbResult<Vec<MealRecord>> {
        self.database.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT m.id AS meal_id, m.user_id, m.eaten_at,
                       c.id AS item_id, c.name, c.calories, c.protein, c.fat, c.carbs
                FROM meals m
                LEFT JOIN meal_item_components c ON c.meal_id = m.id
                WHERE m.user_id = ?1 AND m.eaten_at >= ?2 AND m.eaten_at <= ?3
                ORDER BY m.eaten_at, m.id, c.id
                "#,
            )?;

            let mut rows = stmt.query(params![user_id, format_timestamp(from), format_timestamp(to)])?;
            let mut records: Vec<MealRecord> = Vec::new();

            while let Some(row) = rows.next()? {
                let meal_id: i64 = row.get("meal_id")?;
                if records.last().map(|r| r.id) != Some(meal_id) {
                    records.push(MealRecord {
                        id: meal_id,
                        user_id: row.get("user_id")?,
                        eaten_at: eaten_at_from_row(row, "eaten_at")?,
                        food_items: Vec::new(),
                    });
                }

                let item_id: Option<i64> = row.get("item_id")?;
                if item_id.is_none() {
                    continue;
                }

                let item = FoodItemEntry {
                    name: row.get("name")?,
                    calories: sql_value_to_json(row.get("calories")?),
                    protein: sql_value_to_json(row.get("protein")?),
                    fat: sql_value_to_json(row.get("fat")?),
                    carbs: sql_value_to_json(row.get("carbs")?),
                };
                if let Some(record) = records.last_mut() {
                    record.food_items.push(item);
                }
            }

            Ok(records)
        })
    }
}

#[async_trait]
impl MealRecordSource for SqliteMealStore {
    async fn fetch_meals(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MealRecord>, FetchError> {
        let store = self.clone();
        let user = user_id.to_string();

        let records = tokio::task::spawn_blocking(move || store.fetch_meals_blocking(&user, &from, &to))
            .await
            .map_err(|e| FetchError::Task(e.to_string()))??;

        debug!(user_id, count = records.len(), "Fetched meals from SQLite");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{Macros, Meal, MealCreate, MealItemCreate, MealType};
    use crate::nutrition::get_nutrition_range;
    use chrono::TimeZone;

    fn store() -> SqliteMealStore {
        let database = Database::in_memory().unwrap();
        database.with_conn(|conn| run_migrations(conn)).unwrap();
        SqliteMealStore::new(database)
    }

    fn log_meal(store: &SqliteMealStore, user: &str, eaten_at: DateTime<Utc>, items: &[(&str, Macros)]) -> i64 {
        let data = MealCreate {
            user_id: user.to_string(),
            eaten_at,
            meal_type: MealType::Unspecified,
            notes: None,
            items: items
                .iter()
                .map(|(name, macros)| MealItemCreate {
                    name: name.to_string(),
                    macros: *macros,
                    ..Default::default()
                })
                .collect(),
        };
        store
            .database()
            .with_conn_mut(|conn| Meal::create(conn, &data))
            .unwrap()
            .meal
            .id
    }

    fn utc(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_sql_value_to_json() {
        assert_eq!(sql_value_to_json(SqlValue::Null), Value::Null);
        assert_eq!(sql_value_to_json(SqlValue::Integer(4)), Value::from(4));
        assert_eq!(sql_value_to_json(SqlValue::Real(2.5)), Value::from(2.5));
        assert_eq!(sql_value_to_json(SqlValue::Real(f64::NAN)), Value::Null);
        assert_eq!(
            sql_value_to_json(SqlValue::Text("12".to_string())),
            Value::String("12".to_string())
        );
        assert_eq!(sql_value_to_json(SqlValue::Blob(vec![1])), Value::Null);
    }

    #[tokio::test]
    async fn test_fetch_groups_items_by_meal() {
        let store = store();
        let eggs = Macros::new(140.0, 12.0, 10.0, 1.0);
        let toast = Macros::new(80.0, 3.0, 1.0, 15.0);

        let breakfast = log_meal(&store, "u1", utc(15, 8), &[("Eggs", eggs), ("Toast", toast)]);
        let empty = log_meal(&store, "u1", utc(15, 12), &[]);
        log_meal(&store, "u2", utc(15, 9), &[("Eggs", eggs)]);
        log_meal(&store, "u1", utc(17, 9), &[("Eggs", eggs)]);

        let records = store.fetch_meals("u1", utc(15, 0), utc(16, 0)).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, breakfast);
        assert_eq!(records[0].food_items.len(), 2);
        assert_eq!(records[0].food_items[0].name.as_deref(), Some("Eggs"));
        assert_eq!(records[0].food_items[1].macros(), toast);
        assert_eq!(records[1].id, empty);
        assert!(records[1].food_items.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_keeps_malformed_macros_loose() {
        let store = store();
        let meal_id = log_meal(&store, "u1", utc(15, 8), &[]);
        store
            .database()
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO meal_item_components (meal_id, name, calories, protein, fat, carbs)
                     VALUES (?1, 'Mystery', '120', NULL, 3.5, 'n/a')",
                    [meal_id],
                )?;
                Ok(())
            })
            .unwrap();

        let records = store.fetch_meals("u1", utc(15, 0), utc(15, 23)).await.unwrap();
        assert_eq!(records[0].food_items[0].macros(), Macros::new(120.0, 0.0, 3.5, 0.0));
    }

    #[tokio::test]
    async fn test_range_aggregation_against_sqlite() {
        let store = store();
        let lunch = Macros::new(650.0, 35.0, 20.0, 80.0);
        let snack = Macros::new(150.0, 5.0, 7.0, 18.0);

        log_meal(&store, "u1", utc(1, 12), &[("Burrito", lunch)]);
        log_meal(&store, "u1", utc(3, 12), &[("Burrito", lunch), ("Chips", snack)]);
        log_meal(&store, "u1", utc(3, 16), &[("Apple", snack)]);
        log_meal(&store, "u1", utc(5, 12), &[("Burrito", lunch)]);

        let stats = get_nutrition_range(&store, "u1", &utc(1, 9), &utc(3, 9)).await.unwrap();

        assert_eq!(stats.days.len(), 3);
        assert_eq!(stats.days[0].entries, 1);
        assert_eq!(stats.days[1].entries, 0);
        assert_eq!(stats.days[2].entries, 3);
        assert_eq!(stats.total_calories, 650.0 * 2.0 + 150.0 * 2.0);
        assert_eq!(stats.avg_calories, 533);
    }
}
