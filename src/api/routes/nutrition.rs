//! Nutrition Routes
//!
//! - GET /api/nutrition/daily/:date - Zero-filled totals for one day
//! - GET /api/nutrition/range?startDate&endDate - Per-day totals

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{parse_date, NutritionRangeRow, RangeParams};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::storage::DailyNutrition;

/// GET /api/nutrition/daily/:date
pub async fn daily(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> ApiResult<Json<DailyNutrition>> {
    let date = parse_date(&date, "date")?;
    Ok(Json(state.store.daily_nutrition(date).await?))
}

/// GET /api/nutrition/range
///
/// Only dates with linked entries appear, ascending.
pub async fn range(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<Vec<NutritionRangeRow>>> {
    let (start, end) = params.bounds()?;

    let rows = state
        .store
        .nutrition_totals(start, end)
        .await?
        .into_iter()
        .map(NutritionRangeRow::from)
        .collect();

    Ok(Json(rows))
}
