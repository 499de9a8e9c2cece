mod config;
mod db;
mod error;
mod handlers;
mod metrics_middleware;
mod router;
mod telemetry;

use std::net::SocketAddr;
use std::process;

use tokio::net::TcpListener;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() {
    let _telemetry = telemetry::init_telemetry();

    if let Err(e) = serve().await {
        tracing::error!(error = %e, "server stopped");
        process::exit(1);
    }
}

async fn serve() -> Result<(), String> {
    let config = ServerConfig::load()?;
    let pool = db::create_pool(&config.database_url)
        .await
        .map_err(|e| format!("failed to connect to database: {e}"))?;

    sqlx::migrate!("src/migrations")
        .run(&pool)
        .await
        .map_err(|e| format!("failed to run database migrations: {e}"))?;

    telemetry::spawn_db_pool_metrics(pool.clone());

    let app = router::build(pool, &config.cors_origins);
    let addr = SocketAddr::from((config.host, config.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;

    tracing::info!("Starting stageplan server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
