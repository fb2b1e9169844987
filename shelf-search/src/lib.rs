//! shelf-search library - OpenLibrary author search with local sync
//!
//! Each search fetches a page from OpenLibrary, writes new or changed
//! authors to the local store, and returns the page in a paginated envelope.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod pagination;
pub mod response;
pub mod services;

use services::AuthorSearchService;

/// Service name used for config file lookup and health reporting
pub const MODULE_NAME: &str = "shelf-search";

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<AuthorSearchService>,
}

impl AppState {
    pub fn new(search: AuthorSearchService) -> Self {
        Self {
            search: Arc::new(search),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/api/v1/authors/search", get(api::search_authors))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
