//! HTTP server implementation using Axum.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use guestpass_core::config::GatewayConfig;
use guestpass_core::error::{GuestPassError, Result};
use guestpass_scheduler::SchedulerState;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

/// Shared state for the liveness server.
#[derive(Clone)]
pub struct AppState {
    pub start_time: Instant,
    pub scheduler: watch::Receiver<SchedulerState>,
}

impl AppState {
    pub fn new(scheduler: watch::Receiver<SchedulerState>) -> Self {
        Self {
            start_time: Instant::now(),
            scheduler,
        }
    }
}

/// Static liveness probe.
async fn index() -> &'static str {
    "GuestPass is running"
}

/// Health check with uptime and scheduler state.
async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let scheduler = *state.scheduler.borrow();
    Json(serde_json::json!({
        "status": "ok",
        "service": "guestpass",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "scheduler": scheduler,
    }))
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Bind the listener up front so a taken port fails at startup.
pub async fn bind(config: &GatewayConfig) -> Result<TcpListener> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| GuestPassError::Config(format!("Cannot bind {addr}: {e}")))?;
    tracing::info!("🌐 Liveness endpoint on http://{addr}");
    Ok(listener)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
