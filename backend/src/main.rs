// Rover command center server: auth gateway plus the live telemetry socket.

use anyhow::Context;
use tracing::info;

use rover_command_server::app::AppState;
use rover_command_server::config::ServerConfig;
use rover_command_server::http;
use rover_command_server::users::open_user_store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServerConfig::from_env().context("failed to load server configuration")?;
    config.warn_on_weak_settings();
    let addr = config.socket_addr()?;

    let users = open_user_store(&config.user_store()).await;
    let app_state = AppState::new(&config, users);
    let app = http::router(app_state);

    info!(%addr, interval_ms = config.telemetry_interval_ms, "starting server");
    axum::Server::try_bind(&addr)
        .with_context(|| format!("failed to bind {addr}"))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
