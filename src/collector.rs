use crate::error::Result;
use crate::metrics::{ContainerMetrics, ContainerSample};
use crate::runtime::ContainerRuntime;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of one collection pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectionReport {
    pub listed: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Polls a container runtime and writes what it finds into the gauges
pub struct Collector<R> {
    runtime: R,
    metrics: Arc<ContainerMetrics>,
}

impl<R: ContainerRuntime> Collector<R> {
    pub fn new(runtime: R, metrics: Arc<ContainerMetrics>) -> Self {
        Self { runtime, metrics }
    }

    /// Run one full pass over the visible containers.
    ///
    /// A listing failure is returned to the caller. A container whose stats
    /// cannot be fetched is skipped and keeps whatever values it had.
    pub async fn collect_once(&self) -> Result<CollectionReport> {
        let containers = self.runtime.list_containers().await?;

        let mut report = CollectionReport {
            listed: containers.len(),
            ..Default::default()
        };

        for container in &containers {
            let snapshot = match self.runtime.stats_once(&container.id).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(
                        container_id = %container.id,
                        container_name = %container.name,
                        error = %e,
                        "Failed to get container stats"
                    );
                    report.skipped += 1;
                    continue;
                }
            };

            self.metrics.record(&ContainerSample::new(container, snapshot));
            report.updated += 1;
        }

        debug!(
            listed = report.listed,
            updated = report.updated,
            skipped = report.skipped,
            "Collection pass completed"
        );

        Ok(report)
    }

    /// Collect, sleep for `interval`, repeat.
    ///
    /// Only returns when a pass fails to list containers.
    pub async fn run(&self, interval: Duration) -> Result<()> {
        info!(interval = ?interval, "Starting collector");

        loop {
            self.collect_once().await?;
            tokio::time::sleep(interval).await;
        }
    }
}
