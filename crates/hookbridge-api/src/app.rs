//! Application builder and server run loop.

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use hookbridge_core::config::AppConfig;
use hookbridge_core::error::{AppError, ErrorKind};
use hookbridge_service::{Connector, RelayService};

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state).layer(TraceLayer::new_for_http())
}

/// Runs the HookBridge server until Ctrl+C or SIGTERM.
pub async fn run_server(config: AppConfig, connector: Arc<dyn Connector>) -> Result<(), AppError> {
    tokio::fs::create_dir_all(&config.upload.spool_dir)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create spool dir '{}': {e}", config.upload.spool_dir),
                e,
            )
        })?;

    let relay = Arc::new(RelayService::new(&config, connector)?);
    info!(relay = ?relay, "Webhook relay ready");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_app(AppState::new(Arc::new(config), relay));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!("HookBridge listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    info!("HookBridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
