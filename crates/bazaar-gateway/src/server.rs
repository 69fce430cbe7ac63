//! HTTP server implementation using Axum.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use bazaar_accounts::{AccountsContext, AccountsExecutor};
use bazaar_core::config::GatewayConfig;
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<AccountsExecutor>,
    pub ctx: Arc<AccountsContext>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(executor: Arc<AccountsExecutor>, ctx: Arc<AccountsContext>) -> Self {
        Self {
            executor,
            ctx,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(super::routes::health_check))
        .route("/confirm/{token}", get(super::routes::confirm))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server.
pub async fn start(config: &GatewayConfig, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Gateway server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
