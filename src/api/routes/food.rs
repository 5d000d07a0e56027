//! Food Routes
//!
//! - GET /api/food/search?query= - Search FoodData Central
//! - GET /api/food/details/:fdc_id - Composition, cached locally
//! - POST /api/food/entry - Log a food entry
//! - GET /api/food/entries?date= - Entries for a day
//! - DELETE /api/food/entry/:id - Delete an entry

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    parse_date, parse_id, require_str, CreatedResponse, DateParams, FoodEntryRequest,
    SearchParams, SuccessResponse,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::nutrition::{FoodDetails, FoodSearchResult};
use crate::storage::{FoodEntryWithNutrition, NewFoodEntry};

/// GET /api/food/search
pub async fn search_food(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<FoodSearchResult>>> {
    let query = require_str(params.query, "query")?;
    let results = state.nutrition.search(&query).await?;
    Ok(Json(results))
}

/// GET /api/food/details/:fdc_id
///
/// Served from the cache when present; otherwise fetched, cached and
/// returned.
pub async fn food_details(
    State(state): State<Arc<AppState>>,
    Path(fdc_id): Path<String>,
) -> ApiResult<Json<FoodDetails>> {
    let fdc_id = parse_id(&fdc_id, "FDC ID")?;

    if let Some(cached) = state.store.cached_nutrition(fdc_id).await? {
        tracing::debug!(fdc_id, "Nutrition cache hit");
        return Ok(Json(FoodDetails::from(&cached)));
    }

    let details = state.nutrition.details(fdc_id).await?;
    state.store.upsert_nutrition(&details).await?;

    tracing::info!(fdc_id, food = %details.food_name, "Cached nutrition data");
    Ok(Json(details))
}

/// POST /api/food/entry
pub async fn add_food_entry(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FoodEntryRequest>,
) -> ApiResult<Json<CreatedResponse>> {
    let entry = validate_entry(req)?;
    let linked = entry.fdc_id;

    let id = state.store.add_food_entry(entry).await?;

    tracing::info!(entry_id = id, fdc_id = ?linked, "Logged food entry");
    Ok(Json(CreatedResponse { id, success: true }))
}

/// GET /api/food/entries
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateParams>,
) -> ApiResult<Json<Vec<FoodEntryWithNutrition>>> {
    let date = require_str(params.date, "date")?;
    let date = parse_date(&date, "date")?;

    Ok(Json(state.store.food_entries_on(date).await?))
}

/// DELETE /api/food/entry/:id
pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = parse_id(&id, "entry id")?;
    state.store.delete_food_entry(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

fn validate_entry(req: FoodEntryRequest) -> ApiResult<NewFoodEntry> {
    let food_name = require_str(req.food_name, "foodName")?;
    let unit = require_str(req.unit, "unit")?;
    let date = require_str(req.date, "date")?;

    let amount = match req.amount {
        None => return Err(ApiError::MissingParameter("amount")),
        Some(a) if a == 0.0 => return Err(ApiError::MissingParameter("amount")),
        Some(a) if !a.is_finite() || a < 0.0 => {
            return Err(ApiError::Validation(format!("amount must be positive, got {}", a)))
        }
        Some(a) => a,
    };

    Ok(NewFoodEntry {
        food_name,
        amount,
        unit,
        date: parse_date(&date, "date")?,
        meal_type: req.meal_type.filter(|m| !m.trim().is_empty()),
        fdc_id: req.nutrition_id,
    })
}
