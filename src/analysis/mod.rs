//! Nutrition / Blood-Sugar Correlation
//!
//! ## Pipeline
//!
//! 1. **Daily Aggregator**: nutrition totals per date, weighted by logged amount
//! 2. **Blood-Sugar Aggregator**: avg/min/max/count of readings per date
//! 3. **Series Joiner**: left join driven by nutrition dates
//! 4. **Correlation Calculator**: Pearson r per nutrient vs. daily mean glucose
//!
//! Steps 1-2 are reads against a [`LogStore`](crate::storage::LogStore) and run
//! concurrently; steps 3-4 are pure functions over the two series.

pub mod aggregate;
mod correlation;
mod engine;
mod join;
mod types;

pub use correlation::{calculate_correlations, pearson_correlation, MIN_VALID_DAYS};
pub use engine::{analyze_series, AnalysisEngine, AnalysisError, DEFAULT_READ_TIMEOUT};
pub use join::join_series;
pub use types::{
    AnalysisResult, BloodSugarStats, BloodSugarSummary, CorrelationMap, DailyRecord, Nutrient,
    NutrientTotals, NutritionSummary,
};
