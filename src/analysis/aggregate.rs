//! Per-day aggregation
//!
//! In-memory equivalents of the two grouped range queries: nutrition totals
//! weighted by logged amount, and blood-sugar statistics per date. Backends
//! that cannot push the grouping down to SQL feed their rows through here.

use crate::analysis::types::{BloodSugarStats, Nutrient, NutrientTotals};
use crate::storage::NutritionData;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// A logged food entry joined to its per-100-unit composition
#[derive(Debug, Clone, Copy)]
pub struct LinkedEntry<'a> {
    pub date: NaiveDate,
    /// Amount recorded on the entry-nutrition link
    pub amount: f64,
    pub composition: &'a NutritionData,
}

/// Sum `per_100 * amount / 100` per nutrient per date.
///
/// Only dates with at least one linked entry appear. Output is ascending by date.
pub fn daily_totals<'a, I>(entries: I) -> Vec<NutrientTotals>
where
    I: IntoIterator<Item = LinkedEntry<'a>>,
{
    let mut by_date: BTreeMap<NaiveDate, NutrientTotals> = BTreeMap::new();

    for entry in entries {
        let totals = by_date
            .entry(entry.date)
            .or_insert_with(|| NutrientTotals::empty(entry.date));

        for nutrient in Nutrient::ALL {
            let contribution = entry
                .composition
                .per_100(nutrient)
                .map(|value| value * entry.amount / 100.0);
            totals.accumulate(nutrient, contribution);
        }
    }

    by_date.into_values().collect()
}

#[derive(Debug, Clone, Copy)]
struct Running {
    sum: f64,
    min: f64,
    max: f64,
    count: u32,
}

/// Mean, extrema and count of readings per date, ascending by date.
pub fn blood_sugar_stats<I>(readings: I) -> Vec<BloodSugarStats>
where
    I: IntoIterator<Item = (NaiveDate, f64)>,
{
    let mut by_date: BTreeMap<NaiveDate, Running> = BTreeMap::new();

    for (date, value) in readings {
        by_date
            .entry(date)
            .and_modify(|r| {
                r.sum += value;
                r.min = r.min.min(value);
                r.max = r.max.max(value);
                r.count += 1;
            })
            .or_insert(Running {
                sum: value,
                min: value,
                max: value,
                count: 1,
            });
    }

    by_date
        .into_iter()
        .map(|(date, r)| BloodSugarStats {
            date,
            avg: r.sum / r.count as f64,
            min: r.min,
            max: r.max,
            count: r.count,
        })
        .collect()
}
