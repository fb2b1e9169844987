//! Domain types for author search and synchronization

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use crate::error::SearchError;

/// Default page size when `limit` is not supplied
pub const DEFAULT_LIMIT: u32 = 10;
/// Largest accepted page size
pub const MAX_LIMIT: u32 = 100;
/// Longest accepted search string, in characters, after trimming
pub const MAX_QUERY_CHARS: usize = 100;

/// One record exactly as the remote API returned it.
///
/// Field set is open: anything the source sends is kept so numeric fields can
/// be picked up by name.
pub type RawAuthorRecord = Map<String, Value>;

/// Normalized author entity
///
/// `version` crosses the wire as a decimal string so 64-bit values survive
/// JSON consumers that parse numbers as doubles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    /// External stable identifier (primary key)
    pub id: String,
    pub name: String,
    /// Every numeric field of the source record except the version field
    pub numeric_data: BTreeMap<String, Number>,
    #[serde(with = "version_string")]
    pub version: u64,
}

/// One page of raw results from the remote API
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuthorSearchPage {
    #[serde(default)]
    pub docs: Vec<RawAuthorRecord>,
    /// Total matches reported by the remote API
    #[serde(rename = "numFound", default)]
    pub num_found: u64,
}

/// Validated search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Trimmed search text; empty means "no search"
    pub query: String,
    pub limit: u32,
    pub offset: u64,
}

impl SearchQuery {
    /// Build a query, trimming the text and enforcing parameter ranges
    pub fn new(query: &str, limit: u32, offset: u64) -> Result<Self, SearchError> {
        let query = query.trim();

        if query.chars().count() > MAX_QUERY_CHARS {
            return Err(SearchError::Validation(format!(
                "Search query must be between 1 and {} characters",
                MAX_QUERY_CHARS
            )));
        }
        if limit < 1 {
            return Err(SearchError::Validation("Limit must be at least 1".to_string()));
        }
        if limit > MAX_LIMIT {
            return Err(SearchError::Validation(format!(
                "Limit cannot exceed {}",
                MAX_LIMIT
            )));
        }

        Ok(Self {
            query: query.to_string(),
            limit,
            offset,
        })
    }

    /// Blank queries short-circuit before any I/O
    pub fn is_blank(&self) -> bool {
        self.query.is_empty()
    }
}

/// Serialize `u64` as a decimal string; accept either a string or a number
mod version_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(version: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(version)
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match StringOrNumber::deserialize(deserializer)? {
            StringOrNumber::String(s) => s.trim().parse().map_err(de::Error::custom),
            StringOrNumber::Number(n) => Ok(n),
        }
    }
}
