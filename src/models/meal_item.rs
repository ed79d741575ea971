//! Meal item component model
//!
//! A single food eaten as part of a meal, with its macro amounts.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::Macros;
use crate::db::store::sql_value_to_json;
use crate::db::{DbError, DbResult};
use crate::nutrition::coerce_macro;

/// A food item within a meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealItem {
    pub id: i64,
    pub meal_id: i64,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub macros: Macros,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for adding an item to a meal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealItemCreate {
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    #[serde(default)]
    pub macros: Macros,
}

/// Data for updating a meal item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealItemUpdate {
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub macros: Option<Macros>,
}

impl MealItem {
    /// Create from a database row. Unreadable macro columns read as zero.
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let macro_col = |name: &str| -> rusqlite::Result<f64> {
            let value: rusqlite::types::Value = row.get(name)?;
            Ok(coerce_macro(&sql_value_to_json(value)))
        };

        Ok(Self {
            id: row.get("id")?,
            meal_id: row.get("meal_id")?,
            name: row.get("name")?,
            quantity: row.get("quantity")?,
            unit: row.get("unit")?,
            macros: Macros {
                calories: macro_col("calories")?,
                protein: macro_col("protein")?,
                fat: macro_col("fat")?,
                carbs: macro_col("carbs")?,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Add an item to an existing meal
    pub fn create(conn: &Connection, meal_id: i64, data: &MealItemCreate) -> DbResult<Self> {
        if data.name.trim().is_empty() {
            return Err(DbError::Invalid("meal item name must not be empty".to_string()));
        }

        conn.execute(
            r#"
            INSERT INTO meal_item_components (
                meal_id, name, quantity, unit, calories, protein, fat, carbs
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                meal_id,
                data.name.trim(),
                data.quantity,
                data.unit,
                data.macros.calories,
                data.macros.protein,
                data.macros.fat,
                data.macros.carbs,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::NotFound(format!("meal item {}", id)))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM meal_item_components WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All items for a meal, in insertion order
    pub fn list_for_meal(conn: &Connection, meal_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM meal_item_components WHERE meal_id = ?1 ORDER BY id")?;

        let items = stmt
            .query_map([meal_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Update a meal item; returns `None` if it does not exist
    pub fn update(conn: &Connection, id: i64, data: &MealItemUpdate) -> DbResult<Option<Self>> {
        let Some(existing) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            if name.trim().is_empty() {
                return Err(DbError::Invalid("meal item name must not be empty".to_string()));
            }
            params_vec.push(Box::new(name.trim().to_string()));
            updates.push(format!("name = ?{}", params_vec.len()));
        }
        if let Some(quantity) = data.quantity {
            params_vec.push(Box::new(quantity));
            updates.push(format!("quantity = ?{}", params_vec.len()));
        }
        if let Some(ref unit) = data.unit {
            params_vec.push(Box::new(unit.clone()));
            updates.push(format!("unit = ?{}", params_vec.len()));
        }
        if let Some(macros) = data.macros {
            for (column, value) in [
                ("calories", macros.calories),
                ("protein", macros.protein),
                ("fat", macros.fat),
                ("carbs", macros.carbs),
            ] {
                params_vec.push(Box::new(value));
                updates.push(format!("{} = ?{}", column, params_vec.len()));
            }
        }

        if updates.is_empty() {
            return Ok(Some(existing));
        }

        updates.push("updated_at = datetime('now')".to_string());
        params_vec.push(Box::new(id));

        let sql = format!(
            "UPDATE meal_item_components SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len()
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM meal_item_components WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
