//! REST API for on-demand forecasts.
//!
//! Provides two endpoints:
//! - `GET /config` returns the active forecast configuration
//! - `POST /forecast` forecasts a batch of `(label, timestamp)` pairs

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::config::ConfigError;
use crate::forecast::{ForecastConfig, SmartPersistence};

pub use types::{ErrorResponse, ForecastRequest, ForecastResponse};

/// Immutable application state shared across all request handlers.
///
/// Built once at start-up and wrapped in `Arc`; the engine is stateless, so
/// no locks are needed.
pub struct AppState {
    /// Configuration the engine was built from.
    pub config: ForecastConfig,
    /// The forecast engine.
    pub engine: SmartPersistence,
}

impl AppState {
    /// Builds the engine for `config`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `config` is invalid.
    pub fn new(config: ForecastConfig) -> Result<Self, ConfigError> {
        let engine = SmartPersistence::from_config(&config)?;
        Ok(Self { config, engine })
    }
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
        .route("/config", get(handlers::get_config))
        .route("/forecast", post(handlers::post_forecast))
        .with_state(state)
}

/// Binds to the given address and serves the API until the server stops.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind to `addr` or the
/// server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
