//! Health check endpoint

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::{AppState, MODULE_NAME};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
}

impl HealthStatus {
    fn current() -> Self {
        Self {
            status: "ok",
            module: MODULE_NAME,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// GET /health
///
/// Answers without touching the store or OpenLibrary.
pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus::current())
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
