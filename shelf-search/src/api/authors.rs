//! Author search endpoint
//!
//! Query parameters are validated here; anything malformed is answered with a
//! `VALIDATION_ERROR` envelope before the search pipeline runs.

use axum::extract::{rejection::QueryRejection, Query, State};
use serde::Deserialize;
use tracing::debug;

use crate::error::SearchError;
use crate::models::{Author, SearchQuery, DEFAULT_LIMIT, MAX_LIMIT};
use crate::response::PaginatedResult;
use crate::AppState;

/// Raw query parameters; numbers are parsed by hand so bad input gets a
/// validation envelope instead of a bare rejection. Unknown parameters are
/// rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchParams {
    pub query: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// GET /api/v1/authors/search?query=&limit=&offset=
pub async fn search_authors(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> PaginatedResult<Author> {
    let query = params
        .map_err(|e| SearchError::Validation(e.body_text()))
        .and_then(|Query(params)| parse_search_query(&params));

    match query {
        Ok(query) => state.search.search(&query).await,
        Err(err) => {
            debug!(error = %err, "Rejected author search parameters");
            PaginatedResult::failure(&err)
        }
    }
}

/// Apply defaults and range checks to raw parameters
pub fn parse_search_query(params: &SearchParams) -> Result<SearchQuery, SearchError> {
    let limit = match params.limit.as_deref() {
        None => DEFAULT_LIMIT,
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| SearchError::Validation("Limit must be an integer".to_string()))
            .and_then(|n| {
                u32::try_from(n.max(0)).map_err(|_| {
                    SearchError::Validation(format!("Limit cannot exceed {}", MAX_LIMIT))
                })
            })?,
    };

    let offset = match params.offset.as_deref() {
        None => 0,
        Some(raw) => {
            let n = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| SearchError::Validation("Offset must be an integer".to_string()))?;
            u64::try_from(n)
                .map_err(|_| SearchError::Validation("Offset cannot be negative".to_string()))?
        }
    };

    SearchQuery::new(params.query.as_deref().unwrap_or(""), limit, offset)
}
