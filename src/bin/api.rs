//! Food Log API Server
//!
//! Run with: cargo run --bin foodlog-api
//!
//! # Configuration
//!
//! Read from `FOODLOG_CONFIG` if set, else the first of
//! `~/.config/foodlog/config.toml`, `/etc/foodlog/config.toml` and
//! `./config.toml`, with environment overrides on top:
//! - `FOODLOG_DATABASE_PATH`: SQLite file
//! - `FOODLOG_STORAGE_BACKEND`: `sqlite` (default) or `memory`
//! - `FOODLOG_API_HOST` / `FOODLOG_API_PORT`: bind address (default 0.0.0.0:3001)
//! - `USDA_API_KEY`: FoodData Central key (default: DEMO_KEY)
//! - `FOODLOG_USDA_BASE_URL`: FoodData Central endpoint
//! - `FOODLOG_LOG_LEVEL` / `FOODLOG_LOG_FORMAT`: `info`, `pretty` | `json`
//! - `RUST_LOG`: overrides the configured level

use foodlog::api::{serve, AppState};
use foodlog::config::{Config, LoggingConfig};
use foodlog::nutrition::UsdaClient;
use foodlog::storage::open_store;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::var_os("FOODLOG_CONFIG").map(PathBuf::from) {
        Some(path) => Config::load_with_env(&path)?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging);

    tracing::info!("Starting Food Log API server v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(&config.storage)?;
    tracing::info!(
        backend = store.backend_name(),
        path = %config.storage.database_path,
        "Log store opened"
    );

    if config.usda.api_key == "DEMO_KEY" {
        tracing::warn!("Using USDA DEMO_KEY; set USDA_API_KEY for a real rate limit");
    }
    let usda = Arc::new(UsdaClient::new(config.usda.clone())?);

    let state = AppState::new(store, usda).with_read_timeout(config.analysis.read_timeout());

    serve(state, &config.api).await?;

    tracing::info!("Food Log API server stopped");
    Ok(())
}

/// Install the global subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("foodlog={},tower_http=debug", logging.level).into()
    });

    let json = logging.format.eq_ignore_ascii_case("json");

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}
