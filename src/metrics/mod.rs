//! Container gauges and their text exposition.
//!
//! [`ContainerMetrics`] owns its own [`Registry`]; nothing is registered in the
//! process-wide default registry. Series are overwritten in place and never
//! removed, so a container that disappears keeps its last values.

use crate::error::Result;
use crate::runtime::{ContainerInfo, ResourceSnapshot};
use prometheus::{GaugeVec, Opts, Registry, TextEncoder};

pub const STATUS_METRIC: &str = "docker_container_status";
pub const CPU_METRIC: &str = "docker_container_cpu_usage";
pub const MEMORY_METRIC: &str = "docker_container_memory_usage";

const LABELS: [&str; 2] = ["container_id", "container_name"];

/// Content type of the text exposition format
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerGauge {
    Status,
    CpuUsage,
    MemoryUsage,
}

/// Everything one poll cycle learned about one container
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSample {
    pub id: String,
    pub name: String,
    pub running: bool,
    pub cpu_total_usage: u64,
    pub memory_usage_bytes: u64,
}

impl ContainerSample {
    pub fn new(info: &ContainerInfo, snapshot: ResourceSnapshot) -> Self {
        Self {
            id: info.id.clone(),
            name: info.name.clone(),
            running: info.is_running(),
            cpu_total_usage: snapshot.cpu_total_usage,
            memory_usage_bytes: snapshot.memory_usage_bytes,
        }
    }
}

pub struct ContainerMetrics {
    registry: Registry,
    status: GaugeVec,
    cpu: GaugeVec,
    memory: GaugeVec,
}

impl ContainerMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let status = GaugeVec::new(
            Opts::new(STATUS_METRIC, "Status of Docker containers"),
            &LABELS,
        )?;
        let cpu = GaugeVec::new(
            Opts::new(CPU_METRIC, "CPU usage of Docker containers"),
            &LABELS,
        )?;
        let memory = GaugeVec::new(
            Opts::new(MEMORY_METRIC, "Memory usage of Docker containers"),
            &LABELS,
        )?;

        registry.register(Box::new(status.clone()))?;
        registry.register(Box::new(cpu.clone()))?;
        registry.register(Box::new(memory.clone()))?;

        Ok(Self {
            registry,
            status,
            cpu,
            memory,
        })
    }

    pub fn set_gauge(&self, gauge: ContainerGauge, id: &str, name: &str, value: f64) {
        let vec = match gauge {
            ContainerGauge::Status => &self.status,
            ContainerGauge::CpuUsage => &self.cpu,
            ContainerGauge::MemoryUsage => &self.memory,
        };

        vec.with_label_values(&[id, name]).set(value);
    }

    pub fn record(&self, sample: &ContainerSample) {
        let status = if sample.running { 1.0 } else { 0.0 };

        self.set_gauge(ContainerGauge::Status, &sample.id, &sample.name, status);
        self.set_gauge(
            ContainerGauge::CpuUsage,
            &sample.id,
            &sample.name,
            sample.cpu_total_usage as f64,
        );
        self.set_gauge(
            ContainerGauge::MemoryUsage,
            &sample.id,
            &sample.name,
            sample.memory_usage_bytes as f64,
        );
    }

    /// Render every family in the text exposition format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&self.registry.gather())?)
    }

    /// Number of label sets held by the status family
    pub fn series_count(&self) -> usize {
        self.registry
            .gather()
            .iter()
            .find(|family| family.get_name() == STATUS_METRIC)
            .map(|family| family.get_metric().len())
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub(crate) fn value(&self, metric: &str, id: &str, name: &str) -> Option<f64> {
        self.registry
            .gather()
            .iter()
            .find(|family| family.get_name() == metric)?
            .get_metric()
            .iter()
            .find(|m| {
                let labels = m.get_label();
                labels
                    .iter()
                    .any(|l| l.get_name() == "container_id" && l.get_value() == id)
                    && labels
                        .iter()
                        .any(|l| l.get_name() == "container_name" && l.get_value() == name)
            })
            .map(|m| m.get_gauge().get_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, name: &str, running: bool, cpu: u64, mem: u64) -> ContainerSample {
        ContainerSample {
            id: id.to_string(),
            name: name.to_string(),
            running,
            cpu_total_usage: cpu,
            memory_usage_bytes: mem,
        }
    }

    #[test]
    fn test_empty_registry_renders_nothing() {
        let metrics = ContainerMetrics::new().unwrap();
        assert_eq!(metrics.render().unwrap(), "");
        assert_eq!(metrics.series_count(), 0);
    }

    #[test]
    fn test_record_sets_all_gauges() {
        let metrics = ContainerMetrics::new().unwrap();
        metrics.record(&sample("c1", "web", true, 100, 2048));

        assert_eq!(metrics.value(STATUS_METRIC, "c1", "web"), Some(1.0));
        assert_eq!(metrics.value(CPU_METRIC, "c1", "web"), Some(100.0));
        assert_eq!(metrics.value(MEMORY_METRIC, "c1", "web"), Some(2048.0));
        assert_eq!(metrics.series_count(), 1);
    }

    #[test]
    fn test_render_text_format() {
        let metrics = ContainerMetrics::new().unwrap();
        metrics.record(&sample("c1", "web", true, 100, 2048));

        let text = metrics.render().unwrap();
        assert!(text.contains("# HELP docker_container_status Status of Docker containers"));
        assert!(text.contains("# TYPE docker_container_status gauge"));
        assert!(text.contains(r#"docker_container_status{container_id="c1",container_name="web"} 1"#));
        assert!(text.contains(r#"docker_container_cpu_usage{container_id="c1",container_name="web"} 100"#));
        assert!(text.contains(r#"docker_container_memory_usage{container_id="c1",container_name="web"} 2048"#));
    }

    #[test]
    fn test_record_overwrites_in_place() {
        let metrics = ContainerMetrics::new().unwrap();
        metrics.record(&sample("c1", "web", true, 100, 2048));
        metrics.record(&sample("c1", "web", false, 250, 1024));

        assert_eq!(metrics.value(STATUS_METRIC, "c1", "web"), Some(0.0));
        assert_eq!(metrics.value(CPU_METRIC, "c1", "web"), Some(250.0));
        assert_eq!(metrics.value(MEMORY_METRIC, "c1", "web"), Some(1024.0));
        assert_eq!(metrics.series_count(), 1);
    }

    #[test]
    fn test_renamed_container_gets_new_series() {
        let metrics = ContainerMetrics::new().unwrap();
        metrics.record(&sample("c1", "web", true, 1, 1));
        metrics.record(&sample("c1", "web-2", true, 2, 2));

        assert_eq!(metrics.series_count(), 2);
        assert_eq!(metrics.value(CPU_METRIC, "c1", "web"), Some(1.0));
        assert_eq!(metrics.value(CPU_METRIC, "c1", "web-2"), Some(2.0));
    }

    #[test]
    fn test_sample_from_listing() {
        let info = ContainerInfo {
            id: "c2".to_string(),
            name: "db".to_string(),
            state: "exited".to_string(),
        };
        let snapshot = ResourceSnapshot {
            cpu_total_usage: 7,
            memory_usage_bytes: 9,
        };

        assert_eq!(
            ContainerSample::new(&info, snapshot),
            sample("c2", "db", false, 7, 9)
        );
    }
}
