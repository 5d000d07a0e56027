//! Test doubles for code that sits on top of a [`LogStore`]

use crate::analysis::{BloodSugarStats, NutrientTotals};
use crate::nutrition::FoodDetails;
use crate::storage::{
    BloodSugarReading, FoodEntryWithNutrition, LogStore, MemoryStore, NewFoodEntry, NewReading,
    NutritionData, StorageResult,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

/// In-memory store whose `blood_sugar_stats` read sleeps before answering
pub struct StallingStore {
    inner: MemoryStore,
    stall: Duration,
}

impl StallingStore {
    pub fn new(stall: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            stall,
        }
    }
}

#[async_trait]
impl LogStore for StallingStore {
    fn backend_name(&self) -> &'static str {
        "stalling"
    }

    async fn ping(&self) -> StorageResult<()> {
        self.inner.ping().await
    }

    async fn add_food_entry(&self, entry: NewFoodEntry) -> StorageResult<i64> {
        self.inner.add_food_entry(entry).await
    }

    async fn food_entries_on(&self, date: NaiveDate) -> StorageResult<Vec<FoodEntryWithNutrition>> {
        self.inner.food_entries_on(date).await
    }

    async fn delete_food_entry(&self, id: i64) -> StorageResult<()> {
        self.inner.delete_food_entry(id).await
    }

    async fn cached_nutrition(&self, fdc_id: i64) -> StorageResult<Option<NutritionData>> {
        self.inner.cached_nutrition(fdc_id).await
    }

    async fn upsert_nutrition(&self, details: &FoodDetails) -> StorageResult<NutritionData> {
        self.inner.upsert_nutrition(details).await
    }

    async fn nutrition_totals(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<NutrientTotals>> {
        self.inner.nutrition_totals(start, end).await
    }

    async fn add_reading(&self, reading: NewReading) -> StorageResult<i64> {
        self.inner.add_reading(reading).await
    }

    async fn import_readings(&self, readings: Vec<NewReading>) -> StorageResult<usize> {
        self.inner.import_readings(readings).await
    }

    async fn readings_on(&self, date: NaiveDate) -> StorageResult<Vec<BloodSugarReading>> {
        self.inner.readings_on(date).await
    }

    async fn readings_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<BloodSugarReading>> {
        self.inner.readings_between(start, end).await
    }

    async fn delete_reading(&self, id: i64) -> StorageResult<()> {
        self.inner.delete_reading(id).await
    }

    async fn blood_sugar_stats(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<BloodSugarStats>> {
        tokio::time::sleep(self.stall).await;
        self.inner.blood_sugar_stats(start, end).await
    }
}
