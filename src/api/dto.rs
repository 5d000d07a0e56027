//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.
//!
//! Request fields are optional at the serde level so that an absent field
//! is reported as a 400 with our error body instead of a 422 rejection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analysis::NutrientTotals;
use crate::api::error::{ApiError, ApiResult};

// ============================================
// PARAMETER HELPERS
// ============================================

/// Treat absent and blank string parameters alike
pub fn require_str(value: Option<String>, name: &'static str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingParameter(name))
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(value: &str, name: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::Validation(format!("{} must be a YYYY-MM-DD date, got '{}'", name, value))
    })
}

/// Required date parameter
pub fn require_date(value: Option<String>, name: &'static str) -> ApiResult<NaiveDate> {
    let raw = require_str(value, name)?;
    parse_date(&raw, name)
}

/// Numeric path id
pub fn parse_id(value: &str, what: &str) -> ApiResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::Validation(format!("Invalid {}: '{}'", what, value)))
}

// ============================================
// QUERY PARAMETERS
// ============================================

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DateParams {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl RangeParams {
    /// Both bounds, parsed
    pub fn bounds(self) -> ApiResult<(NaiveDate, NaiveDate)> {
        Ok((
            require_date(self.start_date, "startDate")?,
            require_date(self.end_date, "endDate")?,
        ))
    }
}

/// `?date=` or `?startDate=&endDate=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingsParams {
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// ============================================
// FOOD DTOs
// ============================================

/// Food entry request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntryRequest {
    pub food_name: Option<String>,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub date: Option<String>,
    pub meal_type: Option<String>,
    /// FDC id of a food fetched through `/food/details`
    #[serde(alias = "fdcId")]
    pub nutrition_id: Option<i64>,
}

/// Response for anything that creates a row
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
    pub success: bool,
}

/// Response for deletes
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// ============================================
// NUTRITION DTOs
// ============================================

/// One row of `/nutrition/range`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRangeRow {
    pub date: NaiveDate,
    pub total_calories: Option<f64>,
    pub total_protein: Option<f64>,
    pub total_carbs: Option<f64>,
    pub total_fat: Option<f64>,
    pub total_fiber: Option<f64>,
    pub total_sugar: Option<f64>,
    pub total_sodium: Option<f64>,
}

impl From<NutrientTotals> for NutritionRangeRow {
    fn from(t: NutrientTotals) -> Self {
        Self {
            date: t.date,
            total_calories: t.calories,
            total_protein: t.protein,
            total_carbs: t.carbs,
            total_fat: t.fat,
            total_fiber: t.fiber,
            total_sugar: t.sugar,
            total_sodium: t.sodium,
        }
    }
}

// ============================================
// BLOOD SUGAR DTOs
// ============================================

/// Single reading request; also the element type of an import
#[derive(Debug, Default, Deserialize)]
pub struct ReadingRequest {
    pub reading: Option<f64>,
    pub timestamp: Option<String>,
    pub notes: Option<String>,
}

/// Bulk import request. `readings` is kept raw so a non-array is a 400.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    #[serde(default)]
    pub readings: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub success: bool,
    pub count: usize,
}

// ============================================
// HEALTH DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub uptime_seconds: u64,
    pub version: String,
}
