use std::sync::Arc;

use crate::config::Config;
use crate::engine::Engine;
use crate::observability::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<Engine>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, engine: Arc<Engine>) -> Self {
        Self {
            config: Arc::new(config),
            engine,
            metrics: Arc::new(Metrics::new()),
        }
    }
}
