//! Food Log REST API
//!
//! HTTP API layer, built with Axum.
//!
//! # Endpoints
//!
//! ## Food
//! - `GET /api/food/search?query=` - Search USDA FoodData Central
//! - `GET /api/food/details/:fdc_id` - Food composition (cached)
//! - `POST /api/food/entry` - Log a food entry
//! - `GET /api/food/entries?date=` - Entries for a day
//! - `DELETE /api/food/entry/:id` - Delete an entry
//!
//! ## Nutrition
//! - `GET /api/nutrition/daily/:date` - Totals for a day
//! - `GET /api/nutrition/range?startDate&endDate` - Totals per day
//!
//! ## Blood Sugar
//! - `POST /api/blood-sugar/reading` - Log a reading
//! - `GET /api/blood-sugar/readings` - `?date` or `?startDate&endDate`
//! - `POST /api/blood-sugar/import` - Log a batch of readings
//! - `DELETE /api/blood-sugar/reading/:id` - Delete a reading
//!
//! ## Correlation
//! - `GET /api/correlation/analysis?startDate&endDate` - Nutrient vs blood sugar
//!
//! ## Health
//! - `GET /api/health` - `{"status":"ok"}`
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use foodlog::api::{serve, AppState};
//! use foodlog::config::Config;
//! use foodlog::nutrition::UsdaClient;
//! use foodlog::storage::open_store;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let store = open_store(&config.storage)?;
//!     let usda = Arc::new(UsdaClient::new(config.usda.clone())?);
//!
//!     serve(AppState::new(store, usda), &config.api).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use crate::config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use routes::{blood_sugar, correlation, food, health, nutrition};

/// Largest accepted request body (bulk imports included)
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::status))
        // Food routes
        .route("/food/search", get(food::search_food))
        .route("/food/details/:fdc_id", get(food::food_details))
        .route("/food/entry", post(food::add_food_entry))
        .route("/food/entry/:id", delete(food::delete_entry))
        .route("/food/entries", get(food::list_entries))
        // Nutrition routes
        .route("/nutrition/daily/:date", get(nutrition::daily))
        .route("/nutrition/range", get(nutrition::range))
        // Blood sugar routes
        .route("/blood-sugar/reading", post(blood_sugar::add_reading))
        .route("/blood-sugar/reading/:id", delete(blood_sugar::delete_reading))
        .route("/blood-sugar/readings", get(blood_sugar::list_readings))
        .route("/blood-sugar/import", post(blood_sugar::import_readings))
        // Correlation routes
        .route("/correlation/analysis", get(correlation::analysis))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    let health_routes = Router::new()
        .route("/live", get(health::liveness))
        .route("/ready", get(health::readiness))
        .route("/", get(health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let backend = state.store.backend_name();
    let router = build_router(state).layer(TimeoutLayer::new(Duration::from_secs(
        config.request_timeout_secs,
    )));

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, backend, "Food log API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Food log API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
