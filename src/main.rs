mod cli;
mod collector;
mod config;
mod error;
mod logging;
mod metrics;
mod runtime;
mod server;

use anyhow::Result;
use collector::Collector;
use metrics::ContainerMetrics;
use runtime::DockerRuntime;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::parse();

    match &cli.command {
        Some(cli::Commands::Version) => {
            println!("docker-exporter v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(cli::Commands::Validate { config: file }) => {
            logging::init(&cli)?;

            let path = file.as_deref().or(cli.config.as_deref());
            match config::load_or_default(path) {
                Ok(_) => {
                    match path {
                        Some(path) => println!("Configuration is valid: {}", path.display()),
                        None => println!("Configuration is valid: built-in defaults"),
                    }
                    return Ok(());
                }
                Err(e) => {
                    eprintln!("Invalid configuration: {}", e);
                    std::process::exit(1);
                }
            }
        }
        _ => {}
    }

    logging::init(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting docker-exporter");

    let config = config::load_or_default(cli.config.as_deref())?;

    info!(
        port = config.server.port,
        interval = %config.collector.interval,
        "Configuration loaded"
    );

    match cli.command {
        Some(cli::Commands::Once) => collect_and_print(&config).await,
        _ => server::run(config).await,
    }
}

/// Single pass against the live daemon, exposition text on stdout
async fn collect_and_print(config: &config::Config) -> Result<()> {
    let metrics = Arc::new(ContainerMetrics::new()?);
    let runtime = DockerRuntime::connect(
        config.collector.docker_socket.as_deref(),
        config.collector.all_containers,
    )
    .await?;

    let report = Collector::new(runtime, metrics.clone()).collect_once().await?;
    info!(
        listed = report.listed,
        updated = report.updated,
        skipped = report.skipped,
        "Collection pass completed"
    );

    print!("{}", metrics.render()?);
    Ok(())
}
