// src/main.rs
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use fashion_shop_backend::{config::Config, database, routes, state::AppState, store::PgRecordStore};
use tokio::net::TcpListener;
use tracing_subscriber::fmt::init as tracing_init;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    // The store must be reachable before any request is served
    let db_pool = match database::create_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "DB connection failed");
            return ExitCode::FAILURE;
        }
    };

    let app_state = AppState::new(Arc::new(PgRecordStore::new(db_pool.clone())));
    let app = routes::create_router(app_state);

    // Try port..port+20 to avoid crash when address is in use
    let listener = {
        let mut bound = None;
        for offset in 0u16..=20 {
            let port = config.port.saturating_add(offset);
            let addr = SocketAddr::from((config.host, port));
            match TcpListener::bind(addr).await {
                Ok(l) => { bound = Some((l, addr)); break; }
                Err(e) => {
                    if offset == 0 { tracing::warn!(%addr, error=%e, "Port in use, trying next"); }
                }
            }
        }
        match bound {
            Some((l, addr)) => {
                tracing::info!("Server running on http://{}", addr);
                l
            }
            None => {
                tracing::error!("Failed to bind to any port starting at {} on {}", config.port, config.host);
                db_pool.close().await;
                return ExitCode::FAILURE;
            }
        }
    };

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    db_pool.close().await;

    if let Err(e) = served {
        tracing::error!(error=%e, "Server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error=%e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutting down");
}
