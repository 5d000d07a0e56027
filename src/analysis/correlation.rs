//! Correlation calculator
//!
//! Pearson correlation between each nutrient's daily total and the daily
//! mean blood-sugar reading, over the dates that carry both.

use crate::analysis::types::{CorrelationMap, DailyRecord, Nutrient};

/// Fewer valid dates than this yields no correlation at all
pub const MIN_VALID_DAYS: usize = 2;

/// Compute per-nutrient coefficients for a joined series.
///
/// Returns `None` when fewer than [`MIN_VALID_DAYS`] records have a
/// blood-sugar side.
pub fn calculate_correlations(records: &[DailyRecord]) -> Option<CorrelationMap> {
    let valid: Vec<(&DailyRecord, f64)> = records
        .iter()
        .filter_map(|r| r.blood_sugar.map(|bs| (r, bs.avg)))
        .collect();

    if valid.len() < MIN_VALID_DAYS {
        return None;
    }

    let glucose: Vec<f64> = valid.iter().map(|(_, avg)| *avg).collect();

    let correlations = Nutrient::ALL
        .iter()
        .map(|&nutrient| {
            let intake: Vec<f64> = valid.iter().map(|(r, _)| r.nutrition.get(nutrient)).collect();
            (nutrient, pearson_correlation(&intake, &glucose))
        })
        .collect();

    Some(correlations)
}

/// Calculate Pearson correlation coefficient
///
/// Returns a value between -1 and 1:
/// - 1: perfect positive correlation
/// - 0: no correlation, or either series has zero variance
/// - -1: perfect negative correlation
///
/// Mismatched or empty inputs also give 0.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }

    // Constant series: cancellation in n·Σx² − (Σx)² can leave a residue
    if is_constant(x) || is_constant(y) {
        return 0.0;
    }

    let n = x.len() as f64;

    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|a| a * a).sum();
    let sum_y2: f64 = y.iter().map(|b| b * b).sum();

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x.powi(2)) * (n * sum_y2 - sum_y.powi(2))).sqrt();

    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        (numerator / denominator).clamp(-1.0, 1.0)
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}
