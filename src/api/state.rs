use std::sync::Arc;

use crate::config::Config;
use crate::observability::Metrics;
use crate::repo::LogRepository;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repo: Arc<dyn LogRepository>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, repo: Arc<dyn LogRepository>) -> Self {
        Self {
            config: Arc::new(config),
            repo,
            metrics: Arc::new(Metrics::new()),
        }
    }
}
