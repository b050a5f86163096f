use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Container runtime error: {0}")]
    Runtime(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl From<bollard::errors::Error> for ExporterError {
    fn from(e: bollard::errors::Error) -> Self {
        ExporterError::Runtime(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
