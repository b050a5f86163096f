use super::{ContainerInfo, ContainerRuntime, ResourceSnapshot};
use crate::error::{ExporterError, Result};
use async_trait::async_trait;
use bollard::container::{ListContainersOptions, Stats, StatsOptions};
use bollard::models::ContainerSummary;
use bollard::Docker;
use futures::StreamExt;
use tracing::{debug, info};

/// Timeout in seconds for connections to an explicit socket path
const SOCKET_TIMEOUT_SECS: u64 = 120;

/// Docker Engine API client behind [`ContainerRuntime`]
pub struct DockerRuntime {
    client: Docker,
    all: bool,
}

impl DockerRuntime {
    /// Connect to the daemon and negotiate the API version.
    ///
    /// Without a socket path the platform defaults apply (`DOCKER_HOST` first).
    /// With `all` set, stopped containers are listed as well.
    pub async fn connect(socket_path: Option<&str>, all: bool) -> Result<Self> {
        let client = match socket_path {
            Some(path) => {
                Docker::connect_with_socket(path, SOCKET_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)?
            }
            None => Docker::connect_with_local_defaults()?,
        };

        let client = client.negotiate_version().await?;

        // Verify connection
        client.ping().await?;

        info!(
            socket = socket_path.unwrap_or("default"),
            all_containers = all,
            "Connected to Docker"
        );

        Ok(Self { client, all })
    }

    fn container_info(container: ContainerSummary) -> ContainerInfo {
        let id = container.id.unwrap_or_default();
        let name = display_name(&id, container.names.as_deref());

        ContainerInfo {
            id,
            name,
            state: container.state.unwrap_or_default(),
        }
    }

    fn snapshot(stats: &Stats) -> ResourceSnapshot {
        ResourceSnapshot {
            cpu_total_usage: stats.cpu_stats.cpu_usage.total_usage,
            memory_usage_bytes: stats.memory_stats.usage.unwrap_or(0),
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerInfo>> {
        let options = ListContainersOptions::<String> {
            all: self.all,
            ..Default::default()
        };

        let containers = self.client.list_containers(Some(options)).await?;

        debug!(count = containers.len(), "Listed containers");

        Ok(containers
            .into_iter()
            .map(Self::container_info)
            .collect())
    }

    async fn stats_once(&self, id: &str) -> Result<ResourceSnapshot> {
        let options = StatsOptions {
            stream: false,
            one_shot: true,
        };

        let mut stream = self.client.stats(id, Some(options));

        match stream.next().await {
            Some(Ok(stats)) => Ok(Self::snapshot(&stats)),
            Some(Err(e)) => Err(e.into()),
            None => Err(ExporterError::Runtime(format!(
                "No stats returned for container {}",
                id
            ))),
        }
    }
}

/// First reported name without the leading slash, or the short id when unnamed
fn display_name(id: &str, names: Option<&[String]>) -> String {
    names
        .and_then(|n| n.first())
        .map(|n| n.strip_prefix('/').unwrap_or(n).to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| id.chars().take(12).collect())
}
