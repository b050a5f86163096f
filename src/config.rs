use crate::error::{ExporterError, Result};
use regex::Regex;
use serde::Deserialize;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    #[serde(default)]
    pub isolation_mode: bool,
    #[serde(default = "default_allowed_networks")]
    pub allowed_networks: Vec<String>,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_allowed_networks() -> Vec<String> {
    vec![
        "10.0.0.0/8".to_string(),
        "172.16.0.0/12".to_string(),
        "192.168.0.0/16".to_string(),
        "127.0.0.1/32".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            metrics_path: default_metrics_path(),
            isolation_mode: false,
            allowed_networks: default_allowed_networks(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_interval")]
    pub interval: String,
    /// Unix socket of the Docker daemon; platform defaults and DOCKER_HOST when unset
    #[serde(default)]
    pub docker_socket: Option<String>,
    /// Include stopped containers in the listing
    #[serde(default)]
    pub all_containers: bool,
}

fn default_interval() -> String {
    "10s".to_string()
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            docker_socket: None,
            all_containers: false,
        }
    }
}

impl CollectorConfig {
    pub fn interval(&self) -> Result<Duration> {
        parse_duration(&self.interval)
    }
}

/// Load config from file with environment variable substitution
pub fn load(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ExporterError::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let content = substitute_env_vars(&content)?;

    // An empty file deserializes to null, which means "all defaults"
    let config: Config = if content.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&content)?
    };

    validate(&config)?;

    Ok(config)
}

/// Load the given file, or fall back to the built-in defaults
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load(path),
        None => {
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

pub fn parse_duration(s: &str) -> Result<Duration> {
    humantime::parse_duration(s)
        .map_err(|e| ExporterError::Config(format!("Invalid duration '{}': {}", s, e)))
}

/// Substitute ${VAR} patterns with environment variables
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| ExporterError::Config(format!("Invalid substitution pattern: {}", e)))?;
    let mut result = content.to_string();
    let mut missing_vars = Vec::new();

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        let placeholder = &cap[0];

        match std::env::var(var_name) {
            Ok(value) => {
                result = result.replace(placeholder, &value);
            }
            Err(_) => {
                missing_vars.push(var_name.to_string());
            }
        }
    }

    if !missing_vars.is_empty() {
        for var in &missing_vars {
            let placeholder = format!("${{{}}}", var);
            result = result.replace(&placeholder, "");
        }
        tracing::warn!(
            missing = ?missing_vars,
            "Some environment variables are not set"
        );
    }

    Ok(result)
}

/// Validate configuration
fn validate(config: &Config) -> Result<()> {
    config.server.bind.parse::<IpAddr>().map_err(|_| {
        ExporterError::Config(format!("Invalid bind address: {}", config.server.bind))
    })?;

    if config.server.port == 0 {
        return Err(ExporterError::Config(
            "server.port must be non-zero".to_string(),
        ));
    }

    let path = &config.server.metrics_path;
    if !path.starts_with('/') || path == "/" || path == "/health" {
        return Err(ExporterError::Config(format!(
            "Invalid metrics path '{}': must start with '/' and not shadow '/' or '/health'",
            path
        )));
    }

    // Router syntax would make the path a capture or wildcard route
    if path.contains(['*', ':', '{', '}']) {
        return Err(ExporterError::Config(format!(
            "Invalid metrics path '{}': must not contain '*', ':', '{{' or '}}'",
            path
        )));
    }

    for network in &config.server.allowed_networks {
        network
            .parse::<ipnetwork::IpNetwork>()
            .map_err(|_| ExporterError::Config(format!("Invalid network CIDR: {}", network)))?;
    }

    if config.server.isolation_mode && config.server.allowed_networks.is_empty() {
        tracing::warn!("Network isolation enabled with no allowed networks; every scrape will be rejected");
    }

    let interval = config.collector.interval()?;
    if interval.is_zero() {
        return Err(ExporterError::Config(
            "collector.interval must be greater than zero".to_string(),
        ));
    }

    if let Some(socket) = &config.collector.docker_socket {
        if socket.is_empty() {
            return Err(ExporterError::Config(
                "collector.docker_socket must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Check if an IP is allowed based on network configuration
pub fn is_ip_allowed(ip: &IpAddr, allowed_networks: &[String]) -> bool {
    for network_str in allowed_networks {
        if let Ok(network) = network_str.parse::<ipnetwork::IpNetwork>() {
            if network.contains(*ip) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("DOCKER_EXPORTER_TEST_VAR", "test_value");
        let content = "key: ${DOCKER_EXPORTER_TEST_VAR}";
        let result = substitute_env_vars(content).unwrap();
        assert_eq!(result, "key: test_value");
        std::env::remove_var("DOCKER_EXPORTER_TEST_VAR");
    }

    #[test]
    fn test_missing_env_var_is_blanked() {
        let result = substitute_env_vars("socket: ${DOCKER_EXPORTER_SURELY_UNSET}").unwrap();
        assert_eq!(result, "socket: ");
    }

    #[test]
    fn test_defaults() {
        let config = load_or_default(None).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.metrics_path, "/metrics");
        assert!(!config.server.isolation_mode);
        assert_eq!(config.collector.interval().unwrap(), Duration::from_secs(10));
        assert!(config.collector.docker_socket.is_none());
        assert!(!config.collector.all_containers);
    }

    #[test]
    fn test_load_overrides() {
        let file = write_config(
            "server:\n  port: 9417\n  metrics_path: /scrape\ncollector:\n  interval: 30s\n  all_containers: true\n",
        );
        let config = load(file.path()).unwrap();
        assert_eq!(config.server.port, 9417);
        assert_eq!(config.server.metrics_path, "/scrape");
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.collector.interval().unwrap(), Duration::from_secs(30));
        assert!(config.collector.all_containers);
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let file = write_config("");
        let config = load(file.path()).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Path::new("/nonexistent/docker-exporter.yaml")).unwrap_err();
        assert!(matches!(err, ExporterError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let file = write_config("collector:\n  interval: 0s\n");
        assert!(load(file.path()).is_err());

        let file = write_config("collector:\n  interval: soon\n");
        assert!(load(file.path()).is_err());

        let file = write_config("server:\n  metrics_path: metrics\n");
        assert!(load(file.path()).is_err());

        let file = write_config("server:\n  metrics_path: /health\n");
        assert!(load(file.path()).is_err());

        let file = write_config("server:\n  port: 0\n");
        assert!(load(file.path()).is_err());

        let file = write_config("server:\n  bind: localhost\n");
        assert!(load(file.path()).is_err());

        let file = write_config("server:\n  allowed_networks: [\"10.0.0.0/33\"]\n");
        assert!(load(file.path()).is_err());

        let file = write_config("server:\n  metrics_path: \"/*\"\n");
        assert!(load(file.path()).is_err());
    }

    #[test]
    fn test_validate_rejects_route_syntax_in_metrics_path() {
        for path in ["/*", "/a/*b/c", "/{x}", "/:name", "/metrics/{id}"] {
            let file = write_config(&format!("server:\n  metrics_path: \"{}\"\n", path));
            let err = load(file.path()).unwrap_err();
            assert!(
                matches!(err, ExporterError::Config(ref msg) if msg.contains("must not contain")),
                "accepted metrics path {}: {:?}",
                path,
                err
            );
        }

        let file = write_config("server:\n  metrics_path: /internal/metrics\n");
        assert_eq!(load(file.path()).unwrap().server.metrics_path, "/internal/metrics");
    }

    #[test]
    fn test_ip_allowed() {
        let networks = vec!["10.0.0.0/8".to_string(), "127.0.0.1/32".to_string()];

        assert!(is_ip_allowed(&"10.1.2.3".parse().unwrap(), &networks));
        assert!(is_ip_allowed(&"127.0.0.1".parse().unwrap(), &networks));
        assert!(!is_ip_allowed(&"8.8.8.8".parse().unwrap(), &networks));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert!(parse_duration("ten").is_err());
    }
}
