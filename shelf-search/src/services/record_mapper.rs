//! Raw OpenLibrary author record → [`Author`]
//!
//! Pure function: no I/O, same input always gives the same output.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::MappingError;
use crate::models::{Author, RawAuthorRecord};

/// Stable identifier field of a raw record
pub const ID_FIELD: &str = "key";
/// Display name field of a raw record
pub const NAME_FIELD: &str = "name";
/// Monotonic version field of a raw record
pub const VERSION_FIELD: &str = "_version_";
/// Version assumed when the record carries none
pub const DEFAULT_VERSION: u64 = 1;

/// Normalize one raw record.
///
/// Every numeric field other than `_version_` lands in `numeric_data` under its
/// original name. Strings, booleans, arrays, and objects are skipped.
pub fn map_author(raw: &RawAuthorRecord) -> Result<Author, MappingError> {
    let id = required_string(raw, ID_FIELD)?;
    let name = required_string(raw, NAME_FIELD)?;

    let version = raw
        .get(VERSION_FIELD)
        .and_then(parse_version)
        .unwrap_or(DEFAULT_VERSION);

    let numeric_data = raw
        .iter()
        .filter(|(key, _)| key.as_str() != VERSION_FIELD)
        .filter_map(|(key, value)| match value {
            Value::Number(n) => Some((key.clone(), n.clone())),
            _ => None,
        })
        .collect::<BTreeMap<_, _>>();

    Ok(Author {
        id,
        name,
        numeric_data,
        version,
    })
}

fn required_string(raw: &RawAuthorRecord, field: &'static str) -> Result<String, MappingError> {
    raw.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(MappingError::MissingField(field))
}

/// Versions arrive as decimal strings or as JSON integers.
/// Empty, negative, fractional, or unparseable values count as absent.
fn parse_version(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}
