use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info};

use hmac_sample::config::DEFAULT_LOG_LEVEL;
use hmac_sample::{AppResult, AppState, Config, build_router, metrics, utils};

#[tokio::main]
async fn main() -> ExitCode {
    // Configuration is loaded first so its log level drives the filter;
    // a load failure is reported once logging is up
    let config = Config::from_env();
    let log_level = config
        .as_ref()
        .map_or(DEFAULT_LOG_LEVEL, |c| c.log_level.as_str());

    tracing_subscriber::fmt()
        .with_env_filter(utils::env_filter(log_level))
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!(
        "Starting HMAC Sample Application v{}",
        env!("CARGO_PKG_VERSION")
    );

    match run(config).await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Run the application, returning an exit code on error.
async fn run(config: AppResult<Config>) -> Result<(), exitcode::ExitCode> {
    let config = config.map_err(|e| {
        error!("Configuration error: {e}");
        exitcode::CONFIG
    })?;
    info!(
        host = %config.host,
        port = %config.port,
        log_level = %config.log_level,
        default_secret = config.uses_default_secret(),
        "Configuration loaded"
    );

    if let Some(metrics_addr) = config.metrics_addr() {
        metrics::try_init_metrics(metrics_addr);
    }

    // A secret that cannot key the MAC is fatal here, never per request
    let state = AppState::new(config.clone()).map_err(|e| {
        error!("Failed to initialize request signing: {e}");
        exitcode::CONFIG
    })?;
    let app = build_router(state);

    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address: {e}");
        exitcode::CONFIG
    })?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Server listening on http://{addr}");
    info!("API endpoints:");
    info!("  GET  /                - Service info (unsigned)");
    info!("  GET  /v3/api-docs     - OpenAPI document (unsigned)");
    info!("  GET  /api/demo/sum    - Sum of query parameters a and b");
    info!("  POST /api/demo/sum    - Sum of JSON body {{\"a\", \"b\"}}");

    axum::serve(listener, app)
        .with_graceful_shutdown(utils::shutdown_signal())
        .await
        .map_err(|e| {
            error!("Server error: {e}");
            exitcode::SOFTWARE
        })?;

    info!("Server shutdown complete");
    Ok(())
}
