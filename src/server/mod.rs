mod app_state;
pub mod middleware;
mod routes;
mod shutdown;

pub use app_state::AppState;

use crate::collector::Collector;
use crate::config::Config;
use crate::metrics::ContainerMetrics;
use crate::runtime::DockerRuntime;
use anyhow::{anyhow, Result};
use axum::{middleware as axum_mw, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

pub async fn run(config: Config) -> Result<()> {
    let metrics = Arc::new(ContainerMetrics::new()?);

    let runtime = DockerRuntime::connect(
        config.collector.docker_socket.as_deref(),
        config.collector.all_containers,
    )
    .await?;

    let interval = config.collector.interval()?;
    let collector = Collector::new(runtime, metrics.clone());

    let mut collector_task = tokio::spawn(async move { collector.run(interval).await });

    let state = AppState::new(config.clone(), metrics);
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.bind.parse()?, config.server.port);

    let listener = TcpListener::bind(addr).await?;
    info!(
        address = %addr,
        path = %config.server.metrics_path,
        "Server listening"
    );

    let server = async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown::signal())
        .await
    };

    tokio::select! {
        result = server => {
            collector_task.abort();
            result?;
            info!("Server shutdown complete");
            Ok(())
        }
        joined = &mut collector_task => {
            let err = match joined {
                Ok(Ok(())) => anyhow!("Collector stopped unexpectedly"),
                Ok(Err(e)) => anyhow!("Collector failed: {}", e),
                Err(e) => anyhow!("Collector task panicked: {}", e),
            };
            error!(error = %err, "Collection loop terminated, shutting down");
            Err(err)
        }
    }
}

fn create_router(state: Arc<AppState>) -> Router {
    let mut router = routes::exporter(&state.config.server.metrics_path);

    // Order matters: first applied = last executed
    router = router
        .layer(axum_mw::from_fn(middleware::request_timing))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::network_isolation,
        ));

    router = middleware::apply(router);

    router.with_state(state)
}
