//! Stored record types
//!
//! Rows of the four log tables and the inputs used to create them:
//! - `FoodEntry` / `NewFoodEntry`: what was eaten, how much, and when
//! - `NutritionData`: cached per-100-unit composition keyed by FDC id
//! - `BloodSugarReading` / `NewReading`: glucose readings
//! - `DailyNutrition`: zero-filled totals for one day

use crate::analysis::{Nutrient, NutrientTotals, NutritionSummary};
use crate::storage::{StorageError, StorageResult};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Format used for `created_at` columns
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A logged food entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: i64,
    pub food_name: String,
    pub amount: f64,
    pub unit: String,
    pub date: NaiveDate,
    pub meal_type: Option<String>,
    pub created_at: String,
}

/// Input for logging a food entry
#[derive(Debug, Clone, PartialEq)]
pub struct NewFoodEntry {
    pub food_name: String,
    pub amount: f64,
    pub unit: String,
    pub date: NaiveDate,
    pub meal_type: Option<String>,
    /// FDC id of a cached composition to link, if any
    pub fdc_id: Option<i64>,
}

/// A food entry with its linked composition (all `None` when unlinked)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntryWithNutrition {
    #[serde(flatten)]
    pub entry: FoodEntry,
    pub nutrition_id: Option<i64>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
}

impl FoodEntryWithNutrition {
    /// Entry with no linked composition
    pub fn unlinked(entry: FoodEntry) -> Self {
        Self {
            entry,
            nutrition_id: None,
            calories: None,
            protein: None,
            carbs: None,
            fat: None,
            fiber: None,
            sugar: None,
            sodium: None,
        }
    }

    /// Entry linked to a cached composition
    pub fn linked(entry: FoodEntry, nutrition: &NutritionData) -> Self {
        Self {
            entry,
            nutrition_id: Some(nutrition.id),
            calories: nutrition.calories,
            protein: nutrition.protein,
            carbs: nutrition.carbs,
            fat: nutrition.fat,
            fiber: nutrition.fiber,
            sugar: nutrition.sugar,
            sodium: nutrition.sodium,
        }
    }
}

/// Cached composition of a food, per 100 units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionData {
    pub id: i64,
    pub fdc_id: i64,
    pub food_name: String,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
    pub created_at: String,
}

impl NutritionData {
    /// Amount of a nutrient per 100 units
    pub fn per_100(&self, nutrient: Nutrient) -> Option<f64> {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Carbs => self.carbs,
            Nutrient::Fat => self.fat,
            Nutrient::Fiber => self.fiber,
            Nutrient::Sugar => self.sugar,
            Nutrient::Sodium => self.sodium,
        }
    }
}

/// A stored blood-sugar reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodSugarReading {
    pub id: i64,
    /// Glucose level (mg/dL)
    pub reading: f64,
    /// Instant of the reading, RFC 3339 in UTC
    pub timestamp: String,
    /// UTC calendar date of the instant
    pub date: NaiveDate,
    /// Wall-clock time in the offset the reading was submitted with
    pub time: String,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Input for logging a reading
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub reading: f64,
    pub timestamp: DateTime<FixedOffset>,
    pub notes: Option<String>,
}

impl NewReading {
    /// Validate a raw reading and parse its timestamp
    pub fn parse(reading: f64, timestamp: &str, notes: Option<String>) -> StorageResult<Self> {
        if !reading.is_finite() || reading <= 0.0 {
            return Err(StorageError::Invalid(format!(
                "reading must be a positive number, got {}",
                reading
            )));
        }

        Ok(Self {
            reading,
            timestamp: parse_timestamp(timestamp)?,
            notes: notes.filter(|n| !n.trim().is_empty()),
        })
    }

    /// Date the reading is filed under
    pub fn date(&self) -> NaiveDate {
        self.timestamp.with_timezone(&Utc).date_naive()
    }

    /// `HH:MM:SS` in the submitted offset
    pub fn time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    /// Canonical stored form; sorts chronologically as text
    pub fn timestamp_utc(&self) -> String {
        self.timestamp
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Parse a reading timestamp.
///
/// RFC 3339 keeps its offset; offset-less forms (as sent by HTML
/// `datetime-local` inputs) are taken as UTC.
pub fn parse_timestamp(ts_str: &str) -> StorageResult<DateTime<FixedOffset>> {
    let ts_str = ts_str.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(ts_str) {
        return Ok(dt);
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    for fmt in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(ts_str, fmt) {
            return Ok(dt.and_utc().fixed_offset());
        }
    }

    Err(StorageError::Invalid(format!(
        "unrecognized timestamp: {}",
        ts_str
    )))
}

/// Current time in `created_at` format
pub fn now_created_at() -> String {
    Utc::now().format(CREATED_AT_FORMAT).to_string()
}

/// Nutrition totals for one day, zero-filled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyNutrition {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: NutritionSummary,
}

impl DailyNutrition {
    /// A day with nothing logged
    pub fn zero(date: NaiveDate) -> Self {
        Self {
            date,
            totals: NutritionSummary::default(),
        }
    }
}

impl From<&NutrientTotals> for DailyNutrition {
    fn from(totals: &NutrientTotals) -> Self {
        Self {
            date: totals.date,
            totals: NutritionSummary::from(totals),
        }
    }
}
