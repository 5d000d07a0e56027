//! SQLite log store
//!
//! Four tables: `food_entries`, `nutrition_data` (composition cache keyed by
//! FDC id), `entry_nutrition` (entry -> composition link carrying the logged
//! amount) and `blood_sugar_readings`. The two analysis reads are grouped
//! aggregate queries so only one row per date crosses into Rust.

use crate::analysis::{BloodSugarStats, NutrientTotals};
use crate::nutrition::FoodDetails;
use crate::storage::types::now_created_at;
use crate::storage::{
    BloodSugarReading, FoodEntry, FoodEntryWithNutrition, LogStore, NewFoodEntry, NewReading,
    NutritionData, StorageError, StorageResult,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS food_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        food_name TEXT NOT NULL,
        amount REAL NOT NULL,
        unit TEXT NOT NULL,
        date TEXT NOT NULL,
        meal_type TEXT,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS nutrition_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        fdc_id INTEGER UNIQUE,
        food_name TEXT NOT NULL,
        calories REAL,
        protein REAL,
        carbs REAL,
        fat REAL,
        fiber REAL,
        sugar REAL,
        sodium REAL,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS entry_nutrition (
        entry_id INTEGER REFERENCES food_entries(id) ON DELETE CASCADE,
        nutrition_id INTEGER REFERENCES nutrition_data(id) ON DELETE CASCADE,
        amount REAL
    );

    CREATE TABLE IF NOT EXISTS blood_sugar_readings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        reading REAL NOT NULL,
        timestamp TEXT NOT NULL,
        date TEXT NOT NULL,
        time TEXT NOT NULL,
        notes TEXT,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_food_entries_date ON food_entries(date);
    CREATE INDEX IF NOT EXISTS idx_entry_nutrition_entry ON entry_nutrition(entry_id);
    CREATE INDEX IF NOT EXISTS idx_blood_sugar_date ON blood_sugar_readings(date);
    CREATE INDEX IF NOT EXISTS idx_blood_sugar_timestamp ON blood_sugar_readings(timestamp);
";

const NUTRITION_COLUMNS: &str =
    "id, fdc_id, food_name, calories, protein, carbs, fat, fiber, sugar, sodium, created_at";

const READING_COLUMNS: &str = "id, reading, timestamp, date, time, notes, created_at";

/// SQLite-backed log store.
///
/// rusqlite is synchronous, so every statement runs on tokio's blocking
/// pool and callers such as the analysis timeout are never stalled by a
/// held lock or a slow query.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Create or open a database file
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        let store = Self::with_connection(conn, Some(path))?;
        tracing::info!(path = ?store.path, "Opened SQLite log store");
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> StorageResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Database file path, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[cfg(test)]
    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        lock_connection(&self.conn)
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock_connection(&conn)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StorageError::Lock(format!("SQLite task failed: {}", e)))?
    }
}

fn lock_connection(conn: &Mutex<Connection>) -> StorageResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StorageError::Lock(format!("Failed to lock connection: {}", e)))
}

fn nutrition_from_row(row: &Row<'_>) -> rusqlite::Result<NutritionData> {
    Ok(NutritionData {
        id: row.get(0)?,
        fdc_id: row.get(1)?,
        food_name: row.get(2)?,
        calories: row.get(3)?,
        protein: row.get(4)?,
        carbs: row.get(5)?,
        fat: row.get(6)?,
        fiber: row.get(7)?,
        sugar: row.get(8)?,
        sodium: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn reading_from_row(row: &Row<'_>) -> rusqlite::Result<BloodSugarReading> {
    Ok(BloodSugarReading {
        id: row.get(0)?,
        reading: row.get(1)?,
        timestamp: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn insert_reading(conn: &Connection, reading: &NewReading) -> rusqlite::Result<i64> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO blood_sugar_readings (reading, timestamp, date, time, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    stmt.execute(params![
        reading.reading,
        reading.timestamp_utc(),
        reading.date(),
        reading.time(),
        reading.notes,
        now_created_at(),
    ])?;
    Ok(conn.last_insert_rowid())
}

#[async_trait]
impl LogStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn ping(&self) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    async fn add_food_entry(&self, entry: NewFoodEntry) -> StorageResult<i64> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let nutrition_id = match entry.fdc_id {
                Some(fdc_id) => Some(
                    tx.query_row(
                        "SELECT id FROM nutrition_data WHERE fdc_id = ?1",
                        params![fdc_id],
                        |row| row.get::<_, i64>(0),
                    )
                    .optional()?
                    .ok_or_else(|| {
                        StorageError::NotFound(format!("nutrition data for FDC id {}", fdc_id))
                    })?,
                ),
                None => None,
            };

            tx.execute(
                "INSERT INTO food_entries (food_name, amount, unit, date, meal_type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.food_name,
                    entry.amount,
                    entry.unit,
                    entry.date,
                    entry.meal_type,
                    now_created_at(),
                ],
            )?;
            let entry_id = tx.last_insert_rowid();

            if let Some(nutrition_id) = nutrition_id {
                tx.execute(
                    "INSERT INTO entry_nutrition (entry_id, nutrition_id, amount) VALUES (?1, ?2, ?3)",
                    params![entry_id, nutrition_id, entry.amount],
                )?;
            }

            tx.commit()?;
            Ok(entry_id)
        })
        .await
    }

    async fn food_entries_on(&self, date: NaiveDate) -> StorageResult<Vec<FoodEntryWithNutrition>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT fe.id, fe.food_name, fe.amount, fe.unit, fe.date, fe.meal_type, fe.created_at,
                        en.nutrition_id,
                        nd.calories, nd.protein, nd.carbs, nd.fat, nd.fiber, nd.sugar, nd.sodium
                 FROM food_entries fe
                 LEFT JOIN entry_nutrition en ON fe.id = en.entry_id
                 LEFT JOIN nutrition_data nd ON en.nutrition_id = nd.id
                 WHERE fe.date = ?1
                 ORDER BY fe.created_at ASC, fe.id ASC",
            )?;

            let rows = stmt.query_map(params![date], |row| {
                Ok(FoodEntryWithNutrition {
                    entry: FoodEntry {
                        id: row.get(0)?,
                        food_name: row.get(1)?,
                        amount: row.get(2)?,
                        unit: row.get(3)?,
                        date: row.get(4)?,
                        meal_type: row.get(5)?,
                        created_at: row.get(6)?,
                    },
                    nutrition_id: row.get(7)?,
                    calories: row.get(8)?,
                    protein: row.get(9)?,
                    carbs: row.get(10)?,
                    fat: row.get(11)?,
                    fiber: row.get(12)?,
                    sugar: row.get(13)?,
                    sodium: row.get(14)?,
                })
            })?;

            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn delete_food_entry(&self, id: i64) -> StorageResult<()> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM entry_nutrition WHERE entry_id = ?1", params![id])?;
            tx.execute("DELETE FROM food_entries WHERE id = ?1", params![id])?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn cached_nutrition(&self, fdc_id: i64) -> StorageResult<Option<NutritionData>> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM nutrition_data WHERE fdc_id = ?1", NUTRITION_COLUMNS);
            Ok(conn
                .query_row(&sql, params![fdc_id], nutrition_from_row)
                .optional()?)
        })
        .await
    }

    async fn upsert_nutrition(&self, details: &FoodDetails) -> StorageResult<NutritionData> {
        let details = details.clone();
        self.with_conn(move |conn| {
            // Update in place so existing entry links keep pointing at the same row
            conn.execute(
                "INSERT INTO nutrition_data
                    (fdc_id, food_name, calories, protein, carbs, fat, fiber, sugar, sodium, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(fdc_id) DO UPDATE SET
                    food_name = excluded.food_name,
                    calories = excluded.calories,
                    protein = excluded.protein,
                    carbs = excluded.carbs,
                    fat = excluded.fat,
                    fiber = excluded.fiber,
                    sugar = excluded.sugar,
                    sodium = excluded.sodium",
                params![
                    details.fdc_id,
                    details.food_name,
                    details.calories,
                    details.protein,
                    details.carbs,
                    details.fat,
                    details.fiber,
                    details.sugar,
                    details.sodium,
                    now_created_at(),
                ],
            )?;

            let sql = format!("SELECT {} FROM nutrition_data WHERE fdc_id = ?1", NUTRITION_COLUMNS);
            Ok(conn.query_row(&sql, params![details.fdc_id], nutrition_from_row)?)
        })
        .await
    }

    async fn nutrition_totals(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<NutrientTotals>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT fe.date,
                        SUM(nd.calories * en.amount / 100),
                        SUM(nd.protein * en.amount / 100),
                        SUM(nd.carbs * en.amount / 100),
                        SUM(nd.fat * en.amount / 100),
                        SUM(nd.fiber * en.amount / 100),
                        SUM(nd.sugar * en.amount / 100),
                        SUM(nd.sodium * en.amount / 100)
                 FROM food_entries fe
                 JOIN entry_nutrition en ON fe.id = en.entry_id
                 JOIN nutrition_data nd ON en.nutrition_id = nd.id
                 WHERE fe.date >= ?1 AND fe.date <= ?2
                 GROUP BY fe.date
                 ORDER BY fe.date ASC",
            )?;

            let rows = stmt.query_map(params![start, end], |row| {
                Ok(NutrientTotals {
                    date: row.get(0)?,
                    calories: row.get(1)?,
                    protein: row.get(2)?,
                    carbs: row.get(3)?,
                    fat: row.get(4)?,
                    fiber: row.get(5)?,
                    sugar: row.get(6)?,
                    sodium: row.get(7)?,
                })
            })?;

            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn add_reading(&self, reading: NewReading) -> StorageResult<i64> {
        self.with_conn(move |conn| Ok(insert_reading(conn, &reading)?))
            .await
    }

    async fn import_readings(&self, readings: Vec<NewReading>) -> StorageResult<usize> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            for reading in &readings {
                insert_reading(&tx, reading)?;
            }
            tx.commit()?;
            Ok(readings.len())
        })
        .await
    }

    async fn readings_on(&self, date: NaiveDate) -> StorageResult<Vec<BloodSugarReading>> {
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {} FROM blood_sugar_readings WHERE date = ?1 ORDER BY timestamp ASC, id ASC",
                READING_COLUMNS
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params![date], reading_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn readings_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<BloodSugarReading>> {
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {} FROM blood_sugar_readings
                 WHERE date >= ?1 AND date <= ?2
                 ORDER BY timestamp ASC, id ASC",
                READING_COLUMNS
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params![start, end], reading_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn delete_reading(&self, id: i64) -> StorageResult<()> {
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM blood_sugar_readings WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
    }

    async fn blood_sugar_stats(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<BloodSugarStats>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT date, AVG(reading), MIN(reading), MAX(reading), COUNT(*)
                 FROM blood_sugar_readings
                 WHERE date >= ?1 AND date <= ?2
                 GROUP BY date
                 ORDER BY date ASC",
            )?;

            let rows = stmt.query_map(params![start, end], |row| {
                Ok(BloodSugarStats {
                    date: row.get(0)?,
                    avg: row.get(1)?,
                    min: row.get(2)?,
                    max: row.get(3)?,
                    count: row.get(4)?,
                })
            })?;

            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisEngine, AnalysisError};
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rice() -> FoodDetails {
        FoodDetails {
            fdc_id: 168878,
            food_name: "Rice, white, cooked".to_string(),
            calories: 130.0,
            protein: 2.7,
            carbs: 28.0,
            fat: 0.3,
            fiber: 0.4,
            sugar: 0.1,
            sodium: 1.0,
        }
    }

    fn rice_entry(day: &str, grams: f64) -> NewFoodEntry {
        NewFoodEntry {
            food_name: "Rice".to_string(),
            amount: grams,
            unit: "g".to_string(),
            date: date(day),
            meal_type: Some("lunch".to_string()),
            fdc_id: Some(168878),
        }
    }

    #[tokio::test]
    async fn test_schema_is_idempotent_on_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("food_log.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.upsert_nutrition(&rice()).await.unwrap();
            store.add_food_entry(rice_entry("2024-01-01", 100.0)).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let entries = store.food_entries_on(date("2024-01-01")).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(store.path(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_food_entry_links_cached_nutrition() {
        let store = SqliteStore::open_in_memory().unwrap();
        let cached = store.upsert_nutrition(&rice()).await.unwrap();

        let id = store.add_food_entry(rice_entry("2024-01-01", 150.0)).await.unwrap();
        store
            .add_food_entry(NewFoodEntry {
                food_name: "Mystery snack".to_string(),
                amount: 1.0,
                unit: "piece".to_string(),
                date: date("2024-01-01"),
                meal_type: None,
                fdc_id: None,
            })
            .await
            .unwrap();

        let entries = store.food_entries_on(date("2024-01-01")).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].entry.id, id);
        assert_eq!(entries[0].nutrition_id, Some(cached.id));
        assert_eq!(entries[0].carbs, Some(28.0));
        assert_eq!(entries[1].nutrition_id, None);
        assert_eq!(entries[1].calories, None);
    }

    #[tokio::test]
    async fn test_unknown_fdc_id_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.add_food_entry(rice_entry("2024-01-01", 100.0)).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        assert!(store.food_entries_on(date("2024-01-01")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_keeps_row_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.upsert_nutrition(&rice()).await.unwrap();

        let mut updated = rice();
        updated.calories = 135.0;
        let second = store.upsert_nutrition(&updated).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.calories, Some(135.0));
        assert_eq!(store.cached_nutrition(168878).await.unwrap(), Some(second));
        assert_eq!(store.cached_nutrition(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_nutrition_totals_weighted_and_grouped() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert_nutrition(&rice()).await.unwrap();
        store.add_food_entry(rice_entry("2024-01-01", 200.0)).await.unwrap();
        store.add_food_entry(rice_entry("2024-01-01", 50.0)).await.unwrap();
        store.add_food_entry(rice_entry("2024-01-03", 100.0)).await.unwrap();
        store.add_food_entry(rice_entry("2024-02-01", 100.0)).await.unwrap();

        let totals = store
            .nutrition_totals(date("2024-01-01"), date("2024-01-31"))
            .await
            .unwrap();

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].date, date("2024-01-01"));
        assert_eq!(totals[0].calories, Some(325.0));
        assert_eq!(totals[0].carbs, Some(70.0));
        assert_eq!(totals[1].date, date("2024-01-03"));
        assert_eq!(totals[1].calories, Some(130.0));
    }

    #[tokio::test]
    async fn test_daily_nutrition_zero_filled() {
        let store = SqliteStore::open_in_memory().unwrap();
        let daily = store.daily_nutrition(date("2024-01-01")).await.unwrap();
        assert_eq!(daily.date, date("2024-01-01"));
        assert_eq!(daily.totals.calories, 0.0);
    }

    #[tokio::test]
    async fn test_delete_food_entry_removes_link() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert_nutrition(&rice()).await.unwrap();
        let id = store.add_food_entry(rice_entry("2024-01-01", 100.0)).await.unwrap();

        store.delete_food_entry(id).await.unwrap();
        // idempotent
        store.delete_food_entry(id).await.unwrap();

        assert!(store.food_entries_on(date("2024-01-01")).await.unwrap().is_empty());
        assert!(store
            .nutrition_totals(date("2024-01-01"), date("2024-01-01"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_readings_and_stats() {
        let store = SqliteStore::open_in_memory().unwrap();
        for (ts, value) in [
            ("2024-01-01T12:00:00Z", 140.0),
            ("2024-01-01T07:00:00Z", 100.0),
            ("2024-01-02T07:00:00Z", 95.0),
        ] {
            store
                .add_reading(NewReading::parse(value, ts, None).unwrap())
                .await
                .unwrap();
        }

        let day = store.readings_on(date("2024-01-01")).await.unwrap();
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].reading, 100.0);
        assert_eq!(day[0].time, "07:00:00");

        let stats = store
            .blood_sugar_stats(date("2024-01-01"), date("2024-01-02"))
            .await
            .unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].avg, 120.0);
        assert_eq!(stats[0].min, 100.0);
        assert_eq!(stats[0].max, 140.0);
        assert_eq!(stats[0].count, 2);

        let id = day[0].id;
        store.delete_reading(id).await.unwrap();
        let between = store
            .readings_between(date("2024-01-01"), date("2024-01-02"))
            .await
            .unwrap();
        assert_eq!(between.len(), 2);
        assert!(between.iter().all(|r| r.id != id));
    }

    #[tokio::test]
    async fn test_import_readings() {
        let store = SqliteStore::open_in_memory().unwrap();
        let readings = vec![
            NewReading::parse(120.0, "2024-01-15T08:00:00", Some("Before breakfast".into())).unwrap(),
            NewReading::parse(145.0, "2024-01-15T12:00:00", Some("After lunch".into())).unwrap(),
        ];

        assert_eq!(store.import_readings(readings).await.unwrap(), 2);

        let stored = store.readings_on(date("2024-01-15")).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].notes.as_deref(), Some("After lunch"));
    }

    #[tokio::test]
    async fn test_analysis_over_sqlite() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store
            .upsert_nutrition(&FoodDetails {
                fdc_id: 1,
                food_name: "Glucose tabs".to_string(),
                calories: 0.0,
                protein: 0.0,
                carbs: 100.0,
                fat: 0.0,
                fiber: 0.0,
                sugar: 0.0,
                sodium: 0.0,
            })
            .await
            .unwrap();

        for (day, carbs, glucose) in [
            ("2024-01-01", 50.0, 100.0),
            ("2024-01-02", 60.0, 110.0),
            ("2024-01-03", 70.0, 120.0),
        ] {
            store
                .add_food_entry(NewFoodEntry {
                    food_name: "Glucose tabs".to_string(),
                    amount: carbs,
                    unit: "g".to_string(),
                    date: date(day),
                    meal_type: None,
                    fdc_id: Some(1),
                })
                .await
                .unwrap();
            store
                .add_reading(NewReading::parse(glucose, &format!("{}T09:00:00Z", day), None).unwrap())
                .await
                .unwrap();
        }

        let result = AnalysisEngine::new(store)
            .analyze(date("2024-01-01"), date("2024-01-03"))
            .await
            .unwrap();

        assert_eq!(result.data.len(), 3);
        let correlations = result.correlations.unwrap();
        assert_eq!(correlations[&crate::analysis::Nutrient::Carbs], 1.0);
        assert_eq!(correlations[&crate::analysis::Nutrient::Fat], 0.0);
    }

    #[tokio::test]
    async fn test_ping() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.ping().await.is_ok());
        assert_eq!(store.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn test_held_connection_times_out_analysis() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let guard = store.lock().unwrap();

        let engine = AnalysisEngine::new(store.clone()).read_timeout(Duration::from_millis(50));
        let started = Instant::now();
        let err = engine
            .analyze(date("2024-01-01"), date("2024-01-31"))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(1));

        drop(guard);
        assert!(store.ping().await.is_ok());
    }
}
