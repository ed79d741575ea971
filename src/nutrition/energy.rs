//! Macro grams to energy
//!
//! Atwater factors: 4 kcal/g protein, 9 kcal/g fat, 4 kcal/g carbohydrate.

use serde::{Deserialize, Serialize};

use crate::models::Macros;

pub const PROTEIN_KCAL_PER_GRAM: f64 = 4.0;
pub const FAT_KCAL_PER_GRAM: f64 = 9.0;
pub const CARBS_KCAL_PER_GRAM: f64 = 4.0;

/// Energy contributed by each macro
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroKcal {
    pub protein_kcal: f64,
    pub fat_kcal: f64,
    pub carbs_kcal: f64,
}

impl MacroKcal {
    pub fn total(&self) -> f64 {
        self.protein_kcal + self.fat_kcal + self.carbs_kcal
    }
}

/// Convert macro grams to kcal per macro. `grams.calories` is ignored and
/// nothing is rounded.
pub fn grams_to_kcal_distribution(grams: &Macros) -> MacroKcal {
    MacroKcal {
        protein_kcal: grams.protein * PROTEIN_KCAL_PER_GRAM,
        fat_kcal: grams.fat * FAT_KCAL_PER_GRAM,
        carbs_kcal: grams.carbs * CARBS_KCAL_PER_GRAM,
    }
}
