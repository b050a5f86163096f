mod docker;

pub use docker::DockerRuntime;

use crate::error::Result;
use async_trait::async_trait;

/// State string the runtime reports for a running container
pub const RUNNING_STATE: &str = "running";

/// One entry of a container listing
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub state: String,
}

impl ContainerInfo {
    pub fn is_running(&self) -> bool {
        self.state == RUNNING_STATE
    }
}

/// Point-in-time resource usage of one container
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceSnapshot {
    /// Cumulative CPU time in nanoseconds
    pub cpu_total_usage: u64,
    pub memory_usage_bytes: u64,
}

/// Read side of a container runtime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn list_containers(&self) -> Result<Vec<ContainerInfo>>;

    async fn stats_once(&self, id: &str) -> Result<ResourceSnapshot>;
}
