use crate::models::Dataset;
use crate::stats::HourWindow;
use std::sync::Arc;

/// Shared per-process state. The dataset is read-only once loaded, so handlers
/// share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub hour_window: Option<HourWindow>,
}

impl AppState {
    pub fn new(dataset: Dataset, hour_window: Option<HourWindow>) -> Self {
        Self {
            dataset: Arc::new(dataset),
            hour_window,
        }
    }
}
