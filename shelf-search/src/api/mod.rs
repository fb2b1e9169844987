//! HTTP API handlers for shelf-search

pub mod authors;
pub mod health;

pub use authors::search_authors;
pub use health::health_routes;
