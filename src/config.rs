//! Runtime configuration
//!
//! Read from the environment:
//! - `MEALCAL_DATABASE_PATH`: SQLite file (default `<project>/data/mealcal.db`)
//! - `MEALCAL_UTC_OFFSET`: offset used for day boundaries, e.g. `+02:00` (default UTC)

use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use thiserror::Error;

pub const DATABASE_PATH_VAR: &str = "MEALCAL_DATABASE_PATH";
pub const UTC_OFFSET_VAR: &str = "MEALCAL_UTC_OFFSET";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {var} value '{value}': expected an offset like +02:00")]
    InvalidOffset { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: PathBuf,
    pub utc_offset: FixedOffset,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            std::env::var(DATABASE_PATH_VAR).ok(),
            std::env::var(UTC_OFFSET_VAR).ok(),
        )
    }

    fn from_vars(database_path: Option<String>, utc_offset: Option<String>) -> Result<Self, ConfigError> {
        let database_path = database_path
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let utc_offset = match utc_offset {
            Some(s) if !s.trim().is_empty() => parse_utc_offset(&s)?,
            _ => utc(),
        };

        Ok(Self {
            database_path,
            utc_offset,
        })
    }
}

/// Parse `+HH:MM`, `-HH:MM`, `Z` or `UTC`
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, ConfigError> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(utc());
    }
    trimmed.parse::<FixedOffset>().map_err(|_| ConfigError::InvalidOffset {
        var: UTC_OFFSET_VAR,
        value: s.to_string(),
    })
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// `data/mealcal.db` next to the project root, walking up out of
/// `target/{debug,release}` when run from a cargo build
fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("mealcal.db");
    path
}
