//! # Food Log
//!
//! Food and blood-sugar health log: record meals and glucose readings,
//! look up food composition from USDA FoodData Central, and see how each
//! nutrient's daily intake correlates with daily mean blood sugar.
//!
//! ## Modules
//!
//! - [`storage`]: the [`LogStore`](storage::LogStore) trait with SQLite and in-memory backends
//! - [`analysis`]: daily aggregation, date join and Pearson correlation
//! - [`nutrition`]: USDA FoodData Central client
//! - [`import`]: blood-sugar CSV import
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML + environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use foodlog::analysis::AnalysisEngine;
//! use foodlog::storage::{LogStore, MemoryStore, NewReading};
//! use chrono::NaiveDate;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!
//!     store
//!         .add_reading(NewReading::parse(112.0, "2024-01-15T08:00:00Z", None)?)
//!         .await?;
//!
//!     let engine = AnalysisEngine::new(store);
//!     let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//!     let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
//!     let result = engine.analyze(start, end).await?;
//!
//!     println!("{} days, correlations: {:?}", result.data.len(), result.correlations);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod api;
pub mod config;
pub mod import;
pub mod nutrition;
pub mod storage;

// Re-export top-level types for convenience
pub use storage::{
    open_store, BloodSugarReading, FoodEntry, LogStore, MemoryStore, NewFoodEntry, NewReading,
    NutritionData, SqliteStore, StorageError, StorageResult,
};

pub use analysis::{AnalysisEngine, AnalysisError, AnalysisResult, DailyRecord, Nutrient};

pub use nutrition::{FoodDetails, FoodSearchResult, NutritionApiError, NutritionLookup, UsdaClient};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError, StorageBackend};

pub use import::{ImportError, ReadingsImporter};
