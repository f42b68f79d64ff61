use dashboard_analytics::Pipeline;
use dashboard_core::config::AppConfig;
use dashboard_core::Dataset;
use std::sync::Arc;

/// Shared application state for the server.
///
/// The dataset is loaded once before the server starts and is only read
/// afterwards, so handlers share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(config: AppConfig, dataset: Arc<Dataset>) -> Self {
        Self {
            config,
            pipeline: Arc::new(Pipeline::new(dataset)),
        }
    }
}
