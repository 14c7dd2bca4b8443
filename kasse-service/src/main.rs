use kasse_core::observability::logging::init_tracing;
use kasse_service::{build_router, config::KasseConfig, services::Database, AppState};
use std::net::SocketAddr;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), kasse_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = KasseConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        "Starting kasse service"
    );

    let db = Database::new(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    db.run_migrations().await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    let state = AppState {
        config,
        db,
    };
    let app = build_router(state);

    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
