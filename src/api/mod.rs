//! HTTP control API.
//!
//! # Endpoints
//! - `GET  /api/v1/default_gw`: current default gateway interface
//! - `GET  /api/v1/if_status`: health of every managed interface
//! - `POST /api/v1/force_gateway`: operator override, blocks until resolved
//! - `GET  /api/v1/status`: version and control loop phase
//! - `GET  /api/v1/routes`: default routes as last read from the table
//!
//! # Design Decisions
//! - Handlers only talk to the coordinator through its handle
//! - A rejected override is a normal answer (200, `accepted: false`);
//!   timeouts and a stopped coordinator map to 504 and 503

pub mod handlers;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ApiConfig;
use crate::coordinator::CoordinatorHandle;
use self::handlers::*;

/// Build the control API router.
pub fn router(handle: CoordinatorHandle, config: &ApiConfig) -> Router {
    Router::new()
        .route("/api/v1/default_gw", get(get_default_gw))
        .route("/api/v1/if_status", get(get_if_status))
        .route("/api/v1/force_gateway", post(force_gateway))
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/routes", get(get_routes))
        .with_state(handle)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Serve the API until shutdown fires.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Control API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Control API stopped");
    Ok(())
}
