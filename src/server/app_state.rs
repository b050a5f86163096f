use crate::config::Config;
use crate::metrics::ContainerMetrics;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub start_time: std::time::Instant,
    /// Registry written by the collector and read by every scrape
    pub metrics: Arc<ContainerMetrics>,
}

impl AppState {
    pub fn new(config: Config, metrics: Arc<ContainerMetrics>) -> Arc<Self> {
        Arc::new(Self {
            config,
            start_time: std::time::Instant::now(),
            metrics,
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
