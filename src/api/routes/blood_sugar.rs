//! Blood Sugar Routes
//!
//! - POST /api/blood-sugar/reading - Log one reading
//! - GET /api/blood-sugar/readings?date | ?startDate&endDate - List readings
//! - POST /api/blood-sugar/import - Log a batch, all or nothing
//! - DELETE /api/blood-sugar/reading/:id - Delete a reading

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    parse_id, require_date, require_str, CreatedResponse, ImportRequest, ImportResponse,
    ReadingRequest, ReadingsParams, SuccessResponse,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::storage::{BloodSugarReading, NewReading};

/// POST /api/blood-sugar/reading
pub async fn add_reading(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReadingRequest>,
) -> ApiResult<Json<CreatedResponse>> {
    let reading = validate_reading(req)?;
    let date = reading.date();

    let id = state.store.add_reading(reading).await?;

    tracing::info!(reading_id = id, %date, "Logged blood sugar reading");
    Ok(Json(CreatedResponse { id, success: true }))
}

/// GET /api/blood-sugar/readings
///
/// `date` takes precedence when both forms are given.
pub async fn list_readings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReadingsParams>,
) -> ApiResult<Json<Vec<BloodSugarReading>>> {
    let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

    let readings = if has(&params.date) {
        let date = require_date(params.date, "date")?;
        state.store.readings_on(date).await?
    } else if has(&params.start_date) && has(&params.end_date) {
        let start = require_date(params.start_date, "startDate")?;
        let end = require_date(params.end_date, "endDate")?;
        state.store.readings_between(start, end).await?
    } else {
        return Err(ApiError::Validation(
            "Either date or startDate/endDate required".to_string(),
        ));
    };

    Ok(Json(readings))
}

/// POST /api/blood-sugar/import
pub async fn import_readings(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportRequest>,
) -> ApiResult<Json<ImportResponse>> {
    let serde_json::Value::Array(items) = req.readings else {
        return Err(ApiError::Validation("Readings must be an array".to_string()));
    };

    let readings = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let req: ReadingRequest = serde_json::from_value(item).map_err(|e| {
                ApiError::Validation(format!("readings[{}]: {}", index, e))
            })?;
            validate_reading(req).map_err(|e| {
                ApiError::Validation(format!("readings[{}]: {}", index, e))
            })
        })
        .collect::<ApiResult<Vec<NewReading>>>()?;

    let count = state.store.import_readings(readings).await?;

    tracing::info!(count, "Imported blood sugar readings");
    Ok(Json(ImportResponse {
        success: true,
        count,
    }))
}

/// DELETE /api/blood-sugar/reading/:id
pub async fn delete_reading(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = parse_id(&id, "reading id")?;
    state.store.delete_reading(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

fn validate_reading(req: ReadingRequest) -> ApiResult<NewReading> {
    let reading = match req.reading {
        None => return Err(ApiError::MissingParameter("reading")),
        Some(r) if r == 0.0 => return Err(ApiError::MissingParameter("reading")),
        Some(r) => r,
    };
    let timestamp = require_str(req.timestamp, "timestamp")?;

    Ok(NewReading::parse(reading, &timestamp, req.notes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reading() {
        let reading = validate_reading(ReadingRequest {
            reading: Some(120.0),
            timestamp: Some("2024-01-15T08:00:00Z".into()),
            notes: Some("fasting".into()),
        })
        .unwrap();

        assert_eq!(reading.reading, 120.0);
        assert_eq!(reading.date().to_string(), "2024-01-15");
    }

    #[test]
    fn test_validate_reading_rejections() {
        let missing = ReadingRequest {
            timestamp: Some("2024-01-15T08:00:00Z".into()),
            ..Default::default()
        };
        assert!(matches!(validate_reading(missing), Err(ApiError::MissingParameter("reading"))));

        let no_ts = ReadingRequest {
            reading: Some(100.0),
            ..Default::default()
        };
        assert!(matches!(validate_reading(no_ts), Err(ApiError::MissingParameter("timestamp"))));

        let bad_ts = ReadingRequest {
            reading: Some(100.0),
            timestamp: Some("yesterday".into()),
            notes: None,
        };
        assert!(matches!(validate_reading(bad_ts), Err(ApiError::Storage(_))));
    }
}
