//! Log storage
//!
//! Persistence for food entries, cached nutrition data and blood-sugar
//! readings, behind the [`LogStore`] trait.
//!
//! ## Backends
//!
//! - [`SqliteStore`]: SQLite file (or in-memory database) via rusqlite
//! - [`MemoryStore`]: process-local tables, nothing survives a restart
//!
//! The backend is picked once at startup from [`StorageConfig`] and shared
//! as an `Arc<dyn LogStore>`.

mod error;
mod memory;
mod sqlite;
#[cfg(test)]
pub(crate) mod testing;
mod types;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use types::{
    parse_timestamp, BloodSugarReading, DailyNutrition, FoodEntry, FoodEntryWithNutrition,
    NewFoodEntry, NewReading, NutritionData,
};

use crate::analysis::{BloodSugarStats, NutrientTotals};
use crate::config::{StorageBackend, StorageConfig};
use crate::nutrition::FoodDetails;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

/// Storage operations used by the API and the analysis engine
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Short backend identifier for logs and health output
    fn backend_name(&self) -> &'static str;

    /// Cheap round trip to check the store is usable
    async fn ping(&self) -> StorageResult<()>;

    /// Log a food entry, linking it to cached nutrition when `fdc_id` is set.
    ///
    /// Fails with `NotFound` if `fdc_id` has no cached nutrition row.
    async fn add_food_entry(&self, entry: NewFoodEntry) -> StorageResult<i64>;

    /// Entries for one date with their linked composition, in creation order
    async fn food_entries_on(&self, date: NaiveDate) -> StorageResult<Vec<FoodEntryWithNutrition>>;

    /// Delete an entry and its links. Unknown ids are not an error.
    async fn delete_food_entry(&self, id: i64) -> StorageResult<()>;

    /// Cached composition for an FDC id
    async fn cached_nutrition(&self, fdc_id: i64) -> StorageResult<Option<NutritionData>>;

    /// Insert or refresh the cached composition for `details.fdc_id`
    async fn upsert_nutrition(&self, details: &FoodDetails) -> StorageResult<NutritionData>;

    /// Weighted nutrition totals per date in `[start, end]`, ascending
    async fn nutrition_totals(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<NutrientTotals>>;

    /// Log a single reading
    async fn add_reading(&self, reading: NewReading) -> StorageResult<i64>;

    /// Log a batch of readings; all or nothing
    async fn import_readings(&self, readings: Vec<NewReading>) -> StorageResult<usize>;

    /// Readings filed under one date, by timestamp
    async fn readings_on(&self, date: NaiveDate) -> StorageResult<Vec<BloodSugarReading>>;

    /// Readings filed under `[start, end]`, by timestamp
    async fn readings_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<BloodSugarReading>>;

    /// Delete a reading. Unknown ids are not an error.
    async fn delete_reading(&self, id: i64) -> StorageResult<()>;

    /// Reading statistics per date in `[start, end]`, ascending
    async fn blood_sugar_stats(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<BloodSugarStats>>;

    /// Totals for a single day, zero-filled when nothing is logged
    async fn daily_nutrition(&self, date: NaiveDate) -> StorageResult<DailyNutrition> {
        let totals = self.nutrition_totals(date, date).await?;
        Ok(totals
            .first()
            .map(DailyNutrition::from)
            .unwrap_or_else(|| DailyNutrition::zero(date)))
    }
}

/// Open the configured backend
pub fn open_store(config: &StorageConfig) -> StorageResult<Arc<dyn LogStore>> {
    let store: Arc<dyn LogStore> = match config.backend {
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(&config.database_path)?),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory log store; data will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    Ok(store)
}
