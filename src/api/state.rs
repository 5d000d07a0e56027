//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::analysis::AnalysisEngine;
use crate::nutrition::NutritionLookup;
use crate::storage::LogStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Food and blood-sugar log
    pub store: Arc<dyn LogStore>,
    /// Correlation engine reading from `store`
    pub engine: Arc<AnalysisEngine>,
    /// Food composition source
    pub nutrition: Arc<dyn NutritionLookup>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn LogStore>, nutrition: Arc<dyn NutritionLookup>) -> Self {
        Self {
            engine: Arc::new(AnalysisEngine::new(Arc::clone(&store))),
            store,
            nutrition,
            start_time: Instant::now(),
        }
    }

    /// Replace the analysis engine with one using a different read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.engine = Arc::new(AnalysisEngine::new(Arc::clone(&self.store)).read_timeout(timeout));
        self
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
