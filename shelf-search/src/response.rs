//! Paginated response envelope
//!
//! Every search response, successful or not, has this shape.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{ErrorCode, ResponseStatusCode, SearchError};
use crate::pagination::PaginationMetadata;

pub const MSG_FETCHED: &str = "Authors fetched successfully";
pub const MSG_NO_QUERY: &str = "No search query provided";
pub const MSG_FAILED: &str = "Failed to fetch authors";

/// Error details included in failed responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub status_code: ResponseStatusCode,
    pub message: String,
    pub metadata: PaginationMetadata,
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

impl<T> PaginatedResult<T> {
    pub fn success(data: Vec<T>, metadata: PaginationMetadata) -> Self {
        Self {
            status_code: ResponseStatusCode::Success,
            message: MSG_FETCHED.to_string(),
            metadata,
            data,
            error: None,
        }
    }

    /// Successful empty page for a blank query
    pub fn no_query(limit: u32, offset: u64) -> Self {
        Self {
            status_code: ResponseStatusCode::Success,
            message: MSG_NO_QUERY.to_string(),
            metadata: PaginationMetadata::build(limit, offset, 0),
            data: Vec::new(),
            error: None,
        }
    }

    /// Failed response: no data, zeroed metadata, populated `error`.
    ///
    /// Metadata is zeroed for every failure kind, whatever paging the
    /// request asked for.
    pub fn failure(err: &SearchError) -> Self {
        Self {
            status_code: err.status(),
            message: MSG_FAILED.to_string(),
            metadata: PaginationMetadata::zeroed(),
            data: Vec::new(),
            error: Some(ErrorResponse {
                code: err.code(),
                message: err.public_message(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == ResponseStatusCode::Success
    }
}

impl<T: Serialize> IntoResponse for PaginatedResult<T> {
    /// HTTP status mirrors `statusCode`; the envelope is always the body
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code.as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
