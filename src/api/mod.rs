//! REST API over a live simulation.
//!
//! Endpoints:
//! - `GET /state`: latest snapshot
//! - `GET /topology`: static plant wiring
//! - `POST /mode`: switch watering mode
//! - `POST /billing/reset`: reset one or all billing accounts

pub mod driver;
mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::devices::Topology;

pub use driver::{DriverClient, DriverError, LiveHandle};

/// Application state shared across all request handlers.
///
/// Handlers never touch the engine directly: reads go through the watch
/// channel and writes through the driver's command queue.
pub struct AppState {
    /// Handle to the running driver.
    pub client: DriverClient,
    /// Static plant description.
    pub topology: Topology,
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/topology", get(handlers::get_topology))
        .route("/mode", post(handlers::post_mode))
        .route("/billing/reset", post(handlers::post_billing_reset))
        .with_state(state)
}

/// Binds to the given address and serves the API until the future is dropped.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
