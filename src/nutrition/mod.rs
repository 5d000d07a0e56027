//! Nutrition Lookup
//!
//! Food composition data from USDA FoodData Central. Values are per 100
//! units (grams for most foods) and feed the local `nutrition_data` cache.

mod usda;

pub use usda::{nutrient_ids, UsdaClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSearchResult {
    pub fdc_id: i64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_owner: Option<String>,
}

/// Composition of one food, per 100 units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodDetails {
    pub fdc_id: i64,
    pub food_name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
}

impl From<&crate::storage::NutritionData> for FoodDetails {
    fn from(row: &crate::storage::NutritionData) -> Self {
        Self {
            fdc_id: row.fdc_id,
            food_name: row.food_name.clone(),
            calories: row.calories.unwrap_or(0.0),
            protein: row.protein.unwrap_or(0.0),
            carbs: row.carbs.unwrap_or(0.0),
            fat: row.fat.unwrap_or(0.0),
            fiber: row.fiber.unwrap_or(0.0),
            sugar: row.sugar.unwrap_or(0.0),
            sodium: row.sodium.unwrap_or(0.0),
        }
    }
}

/// Source of food composition data
#[async_trait]
pub trait NutritionLookup: Send + Sync {
    /// Free-text food search
    async fn search(&self, query: &str) -> Result<Vec<FoodSearchResult>, NutritionApiError>;

    /// Composition for one FDC id
    async fn details(&self, fdc_id: i64) -> Result<FoodDetails, NutritionApiError>;
}

/// Errors from the nutrition lookup service
#[derive(Error, Debug)]
pub enum NutritionApiError {
    #[error("Invalid or missing USDA API key. Set USDA_API_KEY or [usda].api_key")]
    InvalidApiKey,

    #[error("Food {0} not found")]
    NotFound(i64),

    #[error("USDA API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("USDA API request timed out")]
    Timeout,

    #[error("USDA API unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}
