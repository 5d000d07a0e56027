//! Analysis data types
//!
//! Request-scoped records flowing through the correlation pipeline:
//! - `NutrientTotals`: one day of summed nutrition (Daily Aggregator output)
//! - `BloodSugarStats`: one day of reading statistics (Blood-Sugar Aggregator output)
//! - `DailyRecord`: the date-keyed join of the two
//! - `AnalysisResult`: joined series plus per-nutrient coefficients

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The fixed set of nutrients tracked per food and per day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Calories,
    Protein,
    Carbs,
    Fat,
    Fiber,
    Sugar,
    Sodium,
}

impl Nutrient {
    /// All nutrients, in reporting order
    pub const ALL: [Nutrient; 7] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Carbs,
        Nutrient::Fat,
        Nutrient::Fiber,
        Nutrient::Sugar,
        Nutrient::Sodium,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Nutrient::Calories => "calories",
            Nutrient::Protein => "protein",
            Nutrient::Carbs => "carbs",
            Nutrient::Fat => "fat",
            Nutrient::Fiber => "fiber",
            Nutrient::Sugar => "sugar",
            Nutrient::Sodium => "sodium",
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Summed nutrition for a single date
///
/// A `None` value means the sum had no contributing values (SQL `SUM`
/// over NULLs); it is read as zero downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientTotals {
    pub date: NaiveDate,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
}

impl NutrientTotals {
    /// Totals with every nutrient absent
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            calories: None,
            protein: None,
            carbs: None,
            fat: None,
            fiber: None,
            sugar: None,
            sodium: None,
        }
    }

    pub fn get(&self, nutrient: Nutrient) -> Option<f64> {
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

    fn slot(&mut self, nutrient: Nutrient) -> &mut Option<f64> {
        match nutrient {
            Nutrient::Calories => &mut self.calories,
            Nutrient::Protein => &mut self.protein,
            Nutrient::Carbs => &mut self.carbs,
            Nutrient::Fat => &mut self.fat,
            Nutrient::Fiber => &mut self.fiber,
            Nutrient::Sugar => &mut self.sugar,
            Nutrient::Sodium => &mut self.sodium,
        }
    }

    /// Add a contribution, treating an absent running total as zero.
    /// An absent contribution leaves the slot untouched.
    pub fn accumulate(&mut self, nutrient: Nutrient, amount: Option<f64>) {
        if let Some(amount) = amount {
            let slot = self.slot(nutrient);
            *slot = Some(slot.unwrap_or(0.0) + amount);
        }
    }
}

/// Reading statistics for a single date. `count` is always >= 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodSugarStats {
    pub date: NaiveDate,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub count: u32,
}

/// Zero-filled nutrition side of a `DailyRecord`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionSummary {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
}

impl NutritionSummary {
    pub fn get(&self, nutrient: Nutrient) -> f64 {
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

impl From<&NutrientTotals> for NutritionSummary {
    fn from(totals: &NutrientTotals) -> Self {
        Self {
            calories: totals.calories.unwrap_or(0.0),
            protein: totals.protein.unwrap_or(0.0),
            carbs: totals.carbs.unwrap_or(0.0),
            fat: totals.fat.unwrap_or(0.0),
            fiber: totals.fiber.unwrap_or(0.0),
            sugar: totals.sugar.unwrap_or(0.0),
            sodium: totals.sodium.unwrap_or(0.0),
        }
    }
}

/// Blood-sugar side of a `DailyRecord`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodSugarSummary {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub count: u32,
}

impl From<&BloodSugarStats> for BloodSugarSummary {
    fn from(stats: &BloodSugarStats) -> Self {
        Self {
            avg: stats.avg,
            min: stats.min,
            max: stats.max,
            count: stats.count,
        }
    }
}

/// One date of the joined series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub nutrition: NutritionSummary,
    #[serde(rename = "bloodSugar")]
    pub blood_sugar: Option<BloodSugarSummary>,
}

/// Nutrient name to Pearson coefficient in [-1, 1]
pub type CorrelationMap = BTreeMap<Nutrient, f64>;

/// Output of a full analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Joined series, ascending by date
    pub data: Vec<DailyRecord>,
    /// `None` when fewer than two dates carry both nutrition and blood sugar
    pub correlations: Option<CorrelationMap>,
}
