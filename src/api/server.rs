use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::{info, warn};

use super::{
    services::{get_logs, get_tables, health, insert_log, not_found, prune_tables},
    state::AppState,
};
use crate::config::Config;
use crate::connector::StoreConnector;
use crate::repo::{LogRepository, PgLogRepo};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All routes of the service, without binding a socket
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/logs", get(get_logs).post(insert_log))
        .route("/tables", get(get_tables).delete(prune_tables))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
        // Transparently decode gzip request bodies
        .layer(RequestDecompressionLayer::new())
}

pub async fn run(config: Config, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);

    let connector = StoreConnector::new(&config.database);
    info!(target_db = connector.target(), "Preparing log store");
    let repo = PgLogRepo::new(connector);
    repo.ensure_schema()
        .await
        .map_err(|e| format!("Failed to prepare log store: {}", e))?;

    let repo: Arc<dyn LogRepository> = Arc::new(repo);
    let state = AppState::new(config, repo.clone());
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "logsink listening");
    repo.insert_log("Server started.").await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    if let Err(err) = repo.insert_log("Server stopped.").await {
        warn!(error = %err, "Failed to record shutdown");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
