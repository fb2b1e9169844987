//! Author persistence
//!
//! Batched version lookup and batched insert-or-update keyed by `id`.
//! The upsert is not version-gated: callers pass only records that the
//! version reconciler has already selected.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::{BTreeMap, HashMap};

use crate::error::StoreError;
use crate::models::Author;

/// Storage operations the sync pipeline depends on
#[async_trait]
pub trait AuthorStore: Send + Sync {
    /// Stored version per id; ids with no row are absent from the map
    async fn fetch_versions(&self, ids: &[String]) -> Result<HashMap<String, u64>, StoreError>;

    /// Insert new authors and overwrite existing ones unconditionally
    async fn upsert(&self, authors: &[Author]) -> Result<(), StoreError>;
}

/// SQLite-backed author store
#[derive(Clone)]
pub struct SqliteAuthorStore {
    pool: SqlitePool,
}

impl SqliteAuthorStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load one author by id
    pub async fn load_author(&self, id: &str) -> Result<Option<Author>, StoreError> {
        let row = sqlx::query("SELECT id, name, numeric_data, version FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: String = row.get("id");
        let numeric_json: String = row.get("numeric_data");
        let numeric_data: BTreeMap<String, serde_json::Number> =
            serde_json::from_str(&numeric_json)?;
        let version = to_u64(&id, row.get("version"))?;

        Ok(Some(Author {
            id,
            name: row.get("name"),
            numeric_data,
            version,
        }))
    }

    /// Number of stored authors
    pub async fn count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl AuthorStore for SqliteAuthorStore {
    async fn fetch_versions(&self, ids: &[String]) -> Result<HashMap<String, u64>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, version FROM authors WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let rows = builder.build().fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<(String, u64), StoreError> {
                let id: String = row.get("id");
                let version = to_u64(&id, row.get("version"))?;
                Ok((id, version))
            })
            .collect()
    }

    async fn upsert(&self, authors: &[Author]) -> Result<(), StoreError> {
        if authors.is_empty() {
            return Ok(());
        }

        // Encode everything before touching the database so a bad record
        // can't leave a half-built statement
        let rows = authors
            .iter()
            .map(|author| {
                let numeric_json = serde_json::to_string(&author.numeric_data)?;
                let version = to_i64(author)?;
                Ok((author.id.clone(), author.name.clone(), numeric_json, version))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO authors (id, name, numeric_data, version) ");
        builder.push_values(rows, |mut b, (id, name, numeric_json, version)| {
            b.push_bind(id)
                .push_bind(name)
                .push_bind(numeric_json)
                .push_bind(version);
        });
        builder.push(
            r#"
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                numeric_data = excluded.numeric_data,
                version = excluded.version,
                updated_at = CURRENT_TIMESTAMP
            "#,
        );

        builder.build().execute(&self.pool).await?;

        tracing::debug!(count = authors.len(), "Upserted authors");
        Ok(())
    }
}

fn to_i64(author: &Author) -> Result<i64, StoreError> {
    i64::try_from(author.version).map_err(|_| StoreError::VersionOutOfRange {
        id: author.id.clone(),
        version: author.version,
    })
}

fn to_u64(id: &str, version: i64) -> Result<u64, StoreError> {
    u64::try_from(version).map_err(|_| StoreError::NegativeVersion {
        id: id.to_string(),
        version,
    })
}
