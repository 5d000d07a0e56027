//! Analysis engine
//!
//! Reads both aggregate series for a date range, then runs the pure
//! join + correlation pipeline. Holds no state between calls.

use crate::analysis::correlation::calculate_correlations;
use crate::analysis::join::join_series;
use crate::analysis::types::{AnalysisResult, BloodSugarStats, NutrientTotals};
use crate::storage::{LogStore, StorageError};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default bound on the two upstream reads
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that abort an analysis request
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// One of the aggregate reads failed
    #[error("Failed to read log data: {0}")]
    Storage(#[from] StorageError),

    /// The aggregate reads did not finish in time
    #[error("Log data reads timed out after {0:?}")]
    Timeout(Duration),
}

/// Nutrition / blood-sugar correlation engine
pub struct AnalysisEngine {
    store: Arc<dyn LogStore>,
    read_timeout: Duration,
}

impl AnalysisEngine {
    /// Create an engine over the given store
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self {
            store,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Builder method: set the upstream read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Analyze the inclusive range `[start, end]`.
    ///
    /// Either both reads succeed and the full pipeline runs, or the call
    /// fails. There is no partial result.
    pub async fn analyze(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AnalysisResult, AnalysisError> {
        let reads = async {
            tokio::try_join!(
                self.store.nutrition_totals(start, end),
                self.store.blood_sugar_stats(start, end),
            )
        };

        let (nutrition, blood_sugar) = tokio::time::timeout(self.read_timeout, reads)
            .await
            .map_err(|_| AnalysisError::Timeout(self.read_timeout))??;

        let result = analyze_series(nutrition, blood_sugar);

        tracing::debug!(
            start = %start,
            end = %end,
            days = result.data.len(),
            has_correlations = result.correlations.is_some(),
            "Correlation analysis complete"
        );

        Ok(result)
    }
}

/// Pure pipeline: join the series by date, then correlate.
pub fn analyze_series(
    nutrition: Vec<NutrientTotals>,
    blood_sugar: Vec<BloodSugarStats>,
) -> AnalysisResult {
    let data = join_series(nutrition, blood_sugar);
    let correlations = calculate_correlations(&data);
    AnalysisResult { data, correlations }
}
