// Application state shared across handlers
use std::sync::Arc;

use crate::{app_config::AppConfig, services::ClassificationEngine};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ClassificationEngine>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(engine: ClassificationEngine, config: AppConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            config: Arc::new(config),
        }
    }
}
