//! Error types for shelf-search
//!
//! Each pipeline stage has its own error; the orchestrator folds them into
//! [`SearchError`], whose variants map one-to-one onto wire error codes.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Remote author search API failures
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error {0}: {1}")]
    Status(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// A record in an otherwise valid response broke the expected shape
    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] MappingError),
}

/// Raw record could not be normalized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("record is missing required field '{0}'")]
    MissingField(&'static str),
}

/// Author store failures (version lookup and upsert)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Version {version} of author {id} exceeds the storable range")]
    VersionOutOfRange { id: String, version: u64 },

    #[error("Stored version {version} of author {id} is negative")]
    NegativeVersion { id: String, version: i64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Wire error codes carried in the response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    ApiError,
    DatabaseError,
    UnknownError,
}

/// Status codes carried in the response envelope (mirrors HTTP semantics)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatusCode {
    Success,
    BadRequest,
    InternalServerError,
    ServiceUnavailable,
}

impl ResponseStatusCode {
    pub fn as_u16(self) -> u16 {
        match self {
            ResponseStatusCode::Success => 200,
            ResponseStatusCode::BadRequest => 400,
            ResponseStatusCode::InternalServerError => 500,
            ResponseStatusCode::ServiceUnavailable => 503,
        }
    }
}

impl Serialize for ResponseStatusCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(self.as_u16())
    }
}

/// Search pipeline error taxonomy
#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed query parameters
    #[error("Validation error: {0}")]
    Validation(String),

    /// Remote fetch (or decoding what it returned) failed
    #[error("Failed to fetch authors from external API: {0}")]
    Api(#[from] RemoteError),

    /// Version lookup or upsert failed
    #[error("Failed to process and update authors: {0}")]
    Database(#[from] StoreError),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl SearchError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SearchError::Validation(_) => ErrorCode::ValidationError,
            SearchError::Api(_) => ErrorCode::ApiError,
            SearchError::Database(_) => ErrorCode::DatabaseError,
            SearchError::Unknown(_) => ErrorCode::UnknownError,
        }
    }

    pub fn status(&self) -> ResponseStatusCode {
        match self {
            SearchError::Validation(_) => ResponseStatusCode::BadRequest,
            SearchError::Api(_) => ResponseStatusCode::ServiceUnavailable,
            SearchError::Database(_) | SearchError::Unknown(_) => {
                ResponseStatusCode::InternalServerError
            }
        }
    }

    /// Message shown to API clients.
    ///
    /// Validation details are echoed back; upstream and database causes stay
    /// in the logs.
    pub fn public_message(&self) -> String {
        match self {
            SearchError::Validation(msg) => msg.clone(),
            SearchError::Api(_) => "Failed to fetch authors from external API".to_string(),
            SearchError::Database(_) => "Failed to process and update authors".to_string(),
            SearchError::Unknown(_) => "An unexpected error occurred".to_string(),
        }
    }
}
