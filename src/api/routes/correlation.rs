//! Correlation Routes
//!
//! - GET /api/correlation/analysis?startDate&endDate - Nutrition vs blood sugar

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::analysis::AnalysisResult;
use crate::api::dto::RangeParams;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /api/correlation/analysis
///
/// `correlations` is `null` when fewer than two days have both nutrition
/// and blood-sugar data.
pub async fn analysis(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<AnalysisResult>> {
    let (start, end) = params.bounds()?;
    let result = state.engine.analyze(start, end).await?;

    tracing::info!(
        %start,
        %end,
        days = result.data.len(),
        correlated = result.correlations.is_some(),
        "Correlation analysis complete"
    );

    Ok(Json(result))
}
