//! # Shelf Common Library
//!
//! Shared code for the Shelf services including:
//! - Error types
//! - Bootstrap configuration (TOML + CLI overrides)
//! - Logging initialization
//! - Database pool setup and the `authors` schema

pub mod config;
pub mod db;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
