//! Veridex API Gateway binary
//!
//! Startup sequence: environment, logging, metrics recorder,
//! configuration, composition root, HTTP server.

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;
use veridex_common::config::AppConfig;
use veridex_common::metrics::{self, EMBEDDING_BUCKETS, LATENCY_BUCKETS, METRICS_PREFIX};
use veridex_gateway::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing; RUST_LOG overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.observability.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("Starting Veridex API Gateway v{}", veridex_common::VERSION);

    config.validate()?;

    // Install the Prometheus recorder before anything records
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_embedding_duration_seconds", METRICS_PREFIX)),
            EMBEDDING_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_generation_duration_seconds", METRICS_PREFIX)),
            EMBEDDING_BUCKETS,
        )?
        .set_buckets_for_metric(Matcher::Suffix("duration_seconds".to_string()), LATENCY_BUCKETS)?
        .install_recorder()?;
    metrics::register_metrics();

    // Build the composition root
    info!(backend = %config.index.backend, "Connecting to the vector index...");
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_config(config, handle).await?;

    // Build the router
    let app = create_router(state);

    // Start the server
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
