//! In-memory log store
//!
//! Process-local tables behind an async `RwLock`. Grouping for the analysis
//! reads goes through [`crate::analysis::aggregate`], so results match the
//! SQLite backend row for row.

use crate::analysis::aggregate::{self, LinkedEntry};
use crate::analysis::{BloodSugarStats, NutrientTotals};
use crate::nutrition::FoodDetails;
use crate::storage::types::now_created_at;
use crate::storage::{
    BloodSugarReading, FoodEntry, FoodEntryWithNutrition, LogStore, NewFoodEntry, NewReading,
    NutritionData, StorageError, StorageResult,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy)]
struct EntryLink {
    entry_id: i64,
    nutrition_id: i64,
    amount: f64,
}

#[derive(Debug, Default)]
struct Tables {
    food_entries: Vec<FoodEntry>,
    nutrition: Vec<NutritionData>,
    links: Vec<EntryLink>,
    readings: Vec<BloodSugarReading>,
    next_entry_id: i64,
    next_nutrition_id: i64,
    next_reading_id: i64,
}

impl Tables {
    fn nutrition_by_id(&self, id: i64) -> Option<&NutritionData> {
        self.nutrition.iter().find(|n| n.id == id)
    }

    fn insert_reading(&mut self, reading: &NewReading) -> i64 {
        self.next_reading_id += 1;
        let id = self.next_reading_id;
        self.readings.push(BloodSugarReading {
            id,
            reading: reading.reading,
            timestamp: reading.timestamp_utc(),
            date: reading.date(),
            time: reading.time(),
            notes: reading.notes.clone(),
            created_at: now_created_at(),
        });
        id
    }

    fn sorted_readings<F>(&self, keep: F) -> Vec<BloodSugarReading>
    where
        F: Fn(&BloodSugarReading) -> bool,
    {
        let mut readings: Vec<BloodSugarReading> =
            self.readings.iter().filter(|r| keep(r)).cloned().collect();
        readings.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        readings
    }
}

/// In-memory log store
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StorageResult<()> {
        let _tables = self.tables.read().await;
        Ok(())
    }

    async fn add_food_entry(&self, entry: NewFoodEntry) -> StorageResult<i64> {
        let mut tables = self.tables.write().await;

        let nutrition_id = match entry.fdc_id {
            Some(fdc_id) => Some(
                tables
                    .nutrition
                    .iter()
                    .find(|n| n.fdc_id == fdc_id)
                    .map(|n| n.id)
                    .ok_or_else(|| {
                        StorageError::NotFound(format!("nutrition data for FDC id {}", fdc_id))
                    })?,
            ),
            None => None,
        };

        tables.next_entry_id += 1;
        let id = tables.next_entry_id;
        tables.food_entries.push(FoodEntry {
            id,
            food_name: entry.food_name,
            amount: entry.amount,
            unit: entry.unit,
            date: entry.date,
            meal_type: entry.meal_type,
            created_at: now_created_at(),
        });

        if let Some(nutrition_id) = nutrition_id {
            tables.links.push(EntryLink {
                entry_id: id,
                nutrition_id,
                amount: entry.amount,
            });
        }

        Ok(id)
    }

    async fn food_entries_on(&self, date: NaiveDate) -> StorageResult<Vec<FoodEntryWithNutrition>> {
        let tables = self.tables.read().await;

        let mut rows = Vec::new();
        for entry in tables.food_entries.iter().filter(|e| e.date == date) {
            let links: Vec<&EntryLink> = tables
                .links
                .iter()
                .filter(|l| l.entry_id == entry.id)
                .collect();

            if links.is_empty() {
                rows.push(FoodEntryWithNutrition::unlinked(entry.clone()));
                continue;
            }

            for link in links {
                let row = match tables.nutrition_by_id(link.nutrition_id) {
                    Some(nutrition) => FoodEntryWithNutrition::linked(entry.clone(), nutrition),
                    None => FoodEntryWithNutrition {
                        nutrition_id: Some(link.nutrition_id),
                        ..FoodEntryWithNutrition::unlinked(entry.clone())
                    },
                };
                rows.push(row);
            }
        }

        rows.sort_by(|a, b| {
            a.entry
                .created_at
                .cmp(&b.entry.created_at)
                .then(a.entry.id.cmp(&b.entry.id))
        });
        Ok(rows)
    }

    async fn delete_food_entry(&self, id: i64) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        tables.links.retain(|l| l.entry_id != id);
        tables.food_entries.retain(|e| e.id != id);
        Ok(())
    }

    async fn cached_nutrition(&self, fdc_id: i64) -> StorageResult<Option<NutritionData>> {
        let tables = self.tables.read().await;
        Ok(tables.nutrition.iter().find(|n| n.fdc_id == fdc_id).cloned())
    }

    async fn upsert_nutrition(&self, details: &FoodDetails) -> StorageResult<NutritionData> {
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables.nutrition.iter_mut().find(|n| n.fdc_id == details.fdc_id) {
            existing.food_name = details.food_name.clone();
            existing.calories = Some(details.calories);
            existing.protein = Some(details.protein);
            existing.carbs = Some(details.carbs);
            existing.fat = Some(details.fat);
            existing.fiber = Some(details.fiber);
            existing.sugar = Some(details.sugar);
            existing.sodium = Some(details.sodium);
            return Ok(existing.clone());
        }

        tables.next_nutrition_id += 1;
        let row = NutritionData {
            id: tables.next_nutrition_id,
            fdc_id: details.fdc_id,
            food_name: details.food_name.clone(),
            calories: Some(details.calories),
            protein: Some(details.protein),
            carbs: Some(details.carbs),
            fat: Some(details.fat),
            fiber: Some(details.fiber),
            sugar: Some(details.sugar),
            sodium: Some(details.sodium),
            created_at: now_created_at(),
        };
        tables.nutrition.push(row.clone());
        Ok(row)
    }

    async fn nutrition_totals(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<NutrientTotals>> {
        let tables = self.tables.read().await;

        let linked = tables.links.iter().filter_map(|link| {
            let entry = tables
                .food_entries
                .iter()
                .find(|e| e.id == link.entry_id && e.date >= start && e.date <= end)?;
            let composition = tables.nutrition_by_id(link.nutrition_id)?;
            Some(LinkedEntry {
                date: entry.date,
                amount: link.amount,
                composition,
            })
        });

        Ok(aggregate::daily_totals(linked))
    }

    async fn add_reading(&self, reading: NewReading) -> StorageResult<i64> {
        let mut tables = self.tables.write().await;
        Ok(tables.insert_reading(&reading))
    }

    async fn import_readings(&self, readings: Vec<NewReading>) -> StorageResult<usize> {
        let mut tables = self.tables.write().await;
        for reading in &readings {
            tables.insert_reading(reading);
        }
        Ok(readings.len())
    }

    async fn readings_on(&self, date: NaiveDate) -> StorageResult<Vec<BloodSugarReading>> {
        let tables = self.tables.read().await;
        Ok(tables.sorted_readings(|r| r.date == date))
    }

    async fn readings_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<BloodSugarReading>> {
        let tables = self.tables.read().await;
        Ok(tables.sorted_readings(|r| r.date >= start && r.date <= end))
    }

    async fn delete_reading(&self, id: i64) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        tables.readings.retain(|r| r.id != id);
        Ok(())
    }

    async fn blood_sugar_stats(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<BloodSugarStats>> {
        let tables = self.tables.read().await;
        Ok(aggregate::blood_sugar_stats(
            tables
                .readings
                .iter()
                .filter(|r| r.date >= start && r.date <= end)
                .map(|r| (r.date, r.reading)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn oats() -> FoodDetails {
        FoodDetails {
            fdc_id: 173904,
            food_name: "Oats".to_string(),
            calories: 389.0,
            protein: 16.9,
            carbs: 66.3,
            fat: 6.9,
            fiber: 10.6,
            sugar: 0.0,
            sodium: 2.0,
        }
    }

    fn oats_entry(day: &str, grams: f64) -> NewFoodEntry {
        NewFoodEntry {
            food_name: "Oats".to_string(),
            amount: grams,
            unit: "g".to_string(),
            date: date(day),
            meal_type: Some("breakfast".to_string()),
            fdc_id: Some(173904),
        }
    }

    #[tokio::test]
    async fn test_totals_respect_range_and_links() {
        let store = MemoryStore::new();
        store.upsert_nutrition(&oats()).await.unwrap();
        store.add_food_entry(oats_entry("2024-01-01", 100.0)).await.unwrap();
        store.add_food_entry(oats_entry("2024-01-05", 50.0)).await.unwrap();
        store
            .add_food_entry(NewFoodEntry {
                fdc_id: None,
                ..oats_entry("2024-01-02", 80.0)
            })
            .await
            .unwrap();

        let totals = store
            .nutrition_totals(date("2024-01-01"), date("2024-01-03"))
            .await
            .unwrap();

        // unlinked entry on 01-02 contributes nothing
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].calories, Some(389.0));
    }

    #[tokio::test]
    async fn test_unknown_fdc_id_is_rejected() {
        let store = MemoryStore::new();
        let err = store.add_food_entry(oats_entry("2024-01-01", 40.0)).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upsert_updates_in_place() {
        let store = MemoryStore::new();
        let first = store.upsert_nutrition(&oats()).await.unwrap();
        let mut changed = oats();
        changed.sugar = 1.0;
        let second = store.upsert_nutrition(&changed).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.sugar, Some(1.0));
    }

    #[tokio::test]
    async fn test_entries_and_delete() {
        let store = MemoryStore::new();
        store.upsert_nutrition(&oats()).await.unwrap();
        let id = store.add_food_entry(oats_entry("2024-01-01", 40.0)).await.unwrap();

        let entries = store.food_entries_on(date("2024-01-01")).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].protein, Some(16.9));

        store.delete_food_entry(id).await.unwrap();
        assert!(store.food_entries_on(date("2024-01-01")).await.unwrap().is_empty());
        assert!(store
            .nutrition_totals(date("2024-01-01"), date("2024-01-01"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_readings_sorted_by_timestamp() {
        let store = MemoryStore::new();
        let readings = vec![
            NewReading::parse(150.0, "2024-01-01T18:00:00Z", None).unwrap(),
            NewReading::parse(90.0, "2024-01-01T06:00:00Z", None).unwrap(),
        ];
        assert_eq!(store.import_readings(readings).await.unwrap(), 2);

        let day = store.readings_on(date("2024-01-01")).await.unwrap();
        assert_eq!(day[0].reading, 90.0);
        assert_eq!(day[1].reading, 150.0);

        let stats = store
            .blood_sugar_stats(date("2024-01-01"), date("2024-01-01"))
            .await
            .unwrap();
        assert_eq!(stats[0].avg, 120.0);
        assert_eq!(stats[0].count, 2);
    }
}
