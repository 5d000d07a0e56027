//! Series joiner
//!
//! Left-joins daily nutrition totals against daily blood-sugar statistics.
//! Nutrition dates drive the join: a date with readings but no logged food
//! does not appear in the output.

use crate::analysis::types::{
    BloodSugarStats, BloodSugarSummary, DailyRecord, Nutrient, NutrientTotals, NutritionSummary,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Join the two aggregate series by date.
///
/// Output is ascending by date with one record per nutrition date. Input
/// order does not matter; duplicate dates on either side are merged.
pub fn join_series(
    nutrition: Vec<NutrientTotals>,
    blood_sugar: Vec<BloodSugarStats>,
) -> Vec<DailyRecord> {
    let mut nutrition_by_date: BTreeMap<NaiveDate, NutrientTotals> = BTreeMap::new();
    for totals in nutrition {
        match nutrition_by_date.get_mut(&totals.date) {
            Some(existing) => {
                for nutrient in Nutrient::ALL {
                    existing.accumulate(nutrient, totals.get(nutrient));
                }
            }
            None => {
                nutrition_by_date.insert(totals.date, totals);
            }
        }
    }

    let mut stats_by_date: BTreeMap<NaiveDate, BloodSugarStats> = BTreeMap::new();
    for stats in blood_sugar {
        match stats_by_date.get_mut(&stats.date) {
            Some(existing) => *existing = merge_stats(existing, &stats),
            None => {
                stats_by_date.insert(stats.date, stats);
            }
        }
    }

    nutrition_by_date
        .into_iter()
        .map(|(date, totals)| DailyRecord {
            date,
            nutrition: NutritionSummary::from(&totals),
            blood_sugar: stats_by_date.get(&date).map(BloodSugarSummary::from),
        })
        .collect()
}

/// Combine two partial aggregates for the same date
fn merge_stats(a: &BloodSugarStats, b: &BloodSugarStats) -> BloodSugarStats {
    let count = a.count + b.count;
    BloodSugarStats {
        date: a.date,
        avg: (a.avg * a.count as f64 + b.avg * b.count as f64) / count as f64,
        min: a.min.min(b.min),
        max: a.max.max(b.max),
        count,
    }
}
