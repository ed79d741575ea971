//! Meal model
//!
//! One eating occasion for a user, holding any number of item components.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Deserializer, Serialize};

use super::{Macros, MealItem, MealItemCreate, MealType};
use crate::db::{DbError, DbResult};

/// A logged meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    pub user_id: String,
    pub eaten_at: DateTime<Utc>,
    pub meal_type: MealType,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Meal with its items and summed macros
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealDetail {
    #[serde(flatten)]
    pub meal: Meal,
    pub items: Vec<MealItem>,
    pub totals: Macros,
}

/// Data for creating a meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealCreate {
    pub user_id: String,
    pub eaten_at: DateTime<Utc>,
    #[serde(default)]
    pub meal_type: MealType,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<MealItemCreate>,
}

/// Data for updating a meal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealUpdate {
    pub meal_type: Option<MealType>,
    pub eaten_at: Option<DateTime<Utc>>,
    /// `None` leaves notes alone, `Some(None)` clears them
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<Option<String>>,
}

/// Keeps a present `null` distinct from a missing field
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Storage format for `meals.eaten_at`. Fixed width, so text order is time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Read `eaten_at` from a row, mapping parse failures to a column conversion error
pub(crate) fn eaten_at_from_row(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    parse_timestamp(&raw).map_err(|e| {
        let idx = row.as_ref().column_index(column).unwrap_or(0);
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl Meal {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let meal_type: String = row.get("meal_type")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            eaten_at: eaten_at_from_row(row, "eaten_at")?,
            meal_type: MealType::parse(&meal_type),
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Create a meal and its items in one transaction
    pub fn create(conn: &mut Connection, data: &MealCreate) -> DbResult<MealDetail> {
        if data.user_id.trim().is_empty() {
            return Err(DbError::Invalid("user_id must not be empty".to_string()));
        }

        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO meals (user_id, eaten_at, meal_type, notes)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                data.user_id,
                format_timestamp(&data.eaten_at),
                data.meal_type.as_str(),
                data.notes,
            ],
        )?;
        let id = tx.last_insert_rowid();

        for item in &data.items {
            MealItem::create(&tx, id, item)?;
        }

        let detail = Self::get_detail(&tx, id)?
            .ok_or_else(|| DbError::NotFound(format!("meal {}", id)))?;
        tx.commit()?;

        Ok(detail)
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM meals WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(meal) => Ok(Some(meal)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Meal with items and totals
    pub fn get_detail(conn: &Connection, id: i64) -> DbResult<Option<MealDetail>> {
        let Some(meal) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        let items = MealItem::list_for_meal(conn, id)?;
        let totals = items.iter().map(|i| i.macros).sum();

        Ok(Some(MealDetail { meal, items, totals }))
    }

    /// Meals for a user with `from <= eaten_at <= to`, oldest first
    pub fn list_for_user(
        conn: &Connection,
        user_id: &str,
        from: &DateTime<Utc>,
        to: &DateTime<Utc>,
    ) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM meals WHERE user_id = ?1 AND eaten_at >= ?2 AND eaten_at <= ?3
             ORDER BY eaten_at, id",
        )?;

        let meals = stmt
            .query_map(
                params![user_id, format_timestamp(from), format_timestamp(to)],
                Self::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(meals)
    }

    /// Update a meal; returns `None` if it does not exist
    pub fn update(conn: &Connection, id: i64, data: &MealUpdate) -> DbResult<Option<Self>> {
        let Some(existing) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(meal_type) = data.meal_type {
            params_vec.push(Box::new(meal_type.as_str().to_string()));
            updates.push(format!("meal_type = ?{}", params_vec.len()));
        }
        if let Some(ref eaten_at) = data.eaten_at {
            params_vec.push(Box::new(format_timestamp(eaten_at)));
            updates.push(format!("eaten_at = ?{}", params_vec.len()));
        }
        if let Some(ref notes) = data.notes {
            // Some(None) binds NULL
            params_vec.push(Box::new(notes.clone()));
            updates.push(format!("notes = ?{}", params_vec.len()));
        }

        if updates.is_empty() {
            return Ok(Some(existing));
        }

        updates.push("updated_at = datetime('now')".to_string());
        params_vec.push(Box::new(id));

        let sql = format!(
            "UPDATE meals SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len()
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a meal; its items go with it
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM meals WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
