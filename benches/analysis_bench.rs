//! Benchmarks for the correlation pipeline
//!
//! Run with: cargo bench

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use foodlog::analysis::{analyze_series, pearson_correlation, AnalysisEngine, BloodSugarStats, NutrientTotals};
use foodlog::nutrition::FoodDetails;
use foodlog::storage::{LogStore, NewFoodEntry, NewReading, SqliteStore};
use std::sync::Arc;
use tempfile::tempdir;

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Duration::days(i as i64)
}

fn create_series(days: usize) -> (Vec<NutrientTotals>, Vec<BloodSugarStats>) {
    let nutrition = (0..days)
        .map(|i| {
            let mut t = NutrientTotals::empty(day(i));
            let x = (i % 17) as f64;
            t.calories = Some(1800.0 + x * 40.0);
            t.protein = Some(70.0 + x);
            t.carbs = Some(200.0 + x * 6.0);
            t.fat = Some(60.0 + (i % 5) as f64);
            t.fiber = Some(25.0);
            t.sugar = Some(40.0 + x * 2.0);
            t.sodium = Some(2000.0 + (i % 11) as f64 * 30.0);
            t
        })
        .collect();

    // every third day has no readings
    let blood_sugar = (0..days)
        .filter(|i| i % 3 != 0)
        .map(|i| {
            let avg = 100.0 + (i % 17) as f64 * 1.5;
            BloodSugarStats {
                date: day(i),
                avg,
                min: avg - 15.0,
                max: avg + 30.0,
                count: 4,
            }
        })
        .collect();

    (nutrition, blood_sugar)
}

fn bench_pearson(c: &mut Criterion) {
    let mut group = c.benchmark_group("pearson");

    for size in [30, 365, 3650] {
        let x: Vec<f64> = (0..size).map(|i| (i % 13) as f64).collect();
        let y: Vec<f64> = (0..size).map(|i| (i % 7) as f64 * 2.0).collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| pearson_correlation(black_box(&x), black_box(&y)))
        });
    }

    group.finish();
}

fn bench_analyze_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_series");

    for days in [30, 365, 3650] {
        let (nutrition, blood_sugar) = create_series(days);

        group.throughput(Throughput::Elements(days as u64));
        group.bench_with_input(BenchmarkId::from_parameter(days), &days, |b, _| {
            b.iter(|| analyze_series(black_box(nutrition.clone()), black_box(blood_sugar.clone())))
        });
    }

    group.finish();
}

fn bench_sqlite_analysis(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = tempdir().unwrap();

    let store: Arc<dyn LogStore> = rt.block_on(async {
        let store = SqliteStore::open(dir.path().join("bench.db")).unwrap();

        store
            .upsert_nutrition(&FoodDetails {
                fdc_id: 1,
                food_name: "Oats".to_string(),
                calories: 389.0,
                protein: 16.9,
                carbs: 66.3,
                fat: 6.9,
                fiber: 10.6,
                sugar: 0.0,
                sodium: 2.0,
            })
            .await
            .unwrap();

        // a year of three meals and four readings a day
        for i in 0..365 {
            for meal in 0..3 {
                store
                    .add_food_entry(NewFoodEntry {
                        food_name: "Oats".to_string(),
                        amount: 40.0 + ((i + meal) % 9) as f64 * 10.0,
                        unit: "g".to_string(),
                        date: day(i),
                        meal_type: None,
                        fdc_id: Some(1),
                    })
                    .await
                    .unwrap();
            }

            let readings = (0..4)
                .map(|h| {
                    let ts = format!("{}T{:02}:00:00Z", day(i), 7 + h * 4);
                    NewReading::parse(95.0 + ((i * 7 + h) % 40) as f64, &ts, None).unwrap()
                })
                .collect();
            store.import_readings(readings).await.unwrap();
        }

        Arc::new(store) as Arc<dyn LogStore>
    });

    let engine = AnalysisEngine::new(store);

    let mut group = c.benchmark_group("sqlite_analysis");

    for days in [30usize, 365] {
        let (start, end) = (day(0), day(days - 1));
        group.bench_with_input(BenchmarkId::from_parameter(days), &days, |b, _| {
            b.iter(|| rt.block_on(engine.analyze(black_box(start), black_box(end))).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pearson, bench_analyze_series, bench_sqlite_analysis);
criterion_main!(benches);
