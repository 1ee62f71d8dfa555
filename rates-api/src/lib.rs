//! rates-api library - daily average freight rates
//!
//! Serves `GET /rates`: the daily average price between an origin and a
//! destination (port codes or region slugs) over an inclusive date range.

use std::time::Duration;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod models;
pub mod prices;
pub mod validation;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (read-only)
    pub db: SqlitePool,
    /// Optional bound on each aggregate query
    pub query_timeout: Option<Duration>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, query_timeout: Option<Duration>) -> Self {
        Self { db, query_timeout }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/rates", get(api::get_rates))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
