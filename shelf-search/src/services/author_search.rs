//! Author search orchestration
//!
//! Per request: validate → fetch → map → reconcile + persist → respond.
//! No state is carried between requests. Every failure is turned into a
//! [`PaginatedResult`] envelope here; nothing escapes to the HTTP layer.

use shelf_common::config::{SyncConfig, SyncFailurePolicy};
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::AuthorStore;
use crate::error::{RemoteError, SearchError, StoreError};
use crate::models::{Author, SearchQuery};
use crate::pagination::PaginationMetadata;
use crate::response::PaginatedResult;
use crate::services::openlibrary_client::AuthorSource;
use crate::services::record_mapper::map_author;
use crate::services::version_reconciler::VersionReconciler;

pub struct AuthorSearchService {
    source: Arc<dyn AuthorSource>,
    store: Arc<dyn AuthorStore>,
    reconciler: VersionReconciler,
    failure_policy: SyncFailurePolicy,
}

impl AuthorSearchService {
    pub fn new(
        source: Arc<dyn AuthorSource>,
        store: Arc<dyn AuthorStore>,
        sync: &SyncConfig,
    ) -> Self {
        Self {
            source,
            reconciler: VersionReconciler::new(store.clone(), sync.version_policy),
            store,
            failure_policy: sync.failure_policy,
        }
    }

    /// Run one search. Always returns an envelope, never an error.
    pub async fn search(&self, query: &SearchQuery) -> PaginatedResult<Author> {
        match self.try_search(query).await {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    query = %query.query,
                    code = ?err.code(),
                    error = %err,
                    "Author search failed"
                );
                PaginatedResult::failure(&err)
            }
        }
    }

    async fn try_search(&self, query: &SearchQuery) -> Result<PaginatedResult<Author>, SearchError> {
        if query.is_blank() {
            return Ok(PaginatedResult::no_query(query.limit, query.offset));
        }

        let page = self
            .source
            .fetch(&query.query, query.limit, query.offset)
            .await?;

        let authors = page
            .docs
            .iter()
            .map(map_author)
            .collect::<Result<Vec<_>, _>>()
            .map_err(RemoteError::from)?;

        match self.synchronize(&authors).await {
            Ok(written) => {
                info!(
                    query = %query.query,
                    fetched = authors.len(),
                    written,
                    "Synchronized authors"
                );
            }
            Err(err) => match self.failure_policy {
                SyncFailurePolicy::Ignore => {
                    warn!(
                        query = %query.query,
                        error = %err,
                        "Author sync failed; returning fetched results anyway"
                    );
                }
                SyncFailurePolicy::Fail => return Err(err.into()),
            },
        }

        Ok(PaginatedResult::success(
            authors,
            PaginationMetadata::build(query.limit, query.offset, page.num_found),
        ))
    }

    /// Reconcile then write; returns how many authors were written
    async fn synchronize(&self, authors: &[Author]) -> Result<usize, StoreError> {
        let stale = self.reconciler.filter_needing_update(authors).await?;
        self.store.upsert(&stale).await?;
        Ok(stale.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteAuthorStore;
    use crate::error::{ErrorCode, ResponseStatusCode};
    use crate::models::{AuthorSearchPage, RawAuthorRecord};
    use crate::response::{MSG_FETCHED, MSG_NO_QUERY};
    use async_trait::async_trait;
    use serde_json::{json, Number, Value};
    use shelf_common::config::VersionPolicy;
    use shelf_common::db::init_in_memory_database;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Canned remote responses; counts calls
    struct StubSource {
        page: Mutex<Option<Result<AuthorSearchPage, RemoteError>>>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn returning(page: AuthorSearchPage) -> Arc<Self> {
            Arc::new(Self {
                page: Mutex::new(Some(Ok(page))),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(err: RemoteError) -> Arc<Self> {
            Arc::new(Self {
                page: Mutex::new(Some(Err(err))),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthorSource for StubSource {
        async fn fetch(
            &self,
            _query: &str,
            _limit: u32,
            _offset: u64,
        ) -> Result<AuthorSearchPage, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.page
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(AuthorSearchPage::default()))
        }
    }

    /// Store whose version lookup fails
    struct BrokenStore;

    #[async_trait]
    impl AuthorStore for BrokenStore {
        async fn fetch_versions(&self, _ids: &[String]) -> Result<HashMap<String, u64>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }

        async fn upsert(&self, _authors: &[Author]) -> Result<(), StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }
    }

    /// Lookup succeeds with nothing stored; every write fails
    struct ReadOnlyStore {
        writes: AtomicUsize,
    }

    #[async_trait]
    impl AuthorStore for ReadOnlyStore {
        async fn fetch_versions(&self, _ids: &[String]) -> Result<HashMap<String, u64>, StoreError> {
            Ok(HashMap::new())
        }

        async fn upsert(&self, _authors: &[Author]) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }
    }

    fn doc(value: Value) -> RawAuthorRecord {
        value.as_object().cloned().unwrap()
    }

    fn tolkien_page() -> AuthorSearchPage {
        AuthorSearchPage {
            docs: vec![doc(json!({
                "key": "OL1A",
                "name": "J.R.R. Tolkien",
                "_version_": "5",
                "work_count": 50,
            }))],
            num_found: 1,
        }
    }

    fn sync(version_policy: VersionPolicy, failure_policy: SyncFailurePolicy) -> SyncConfig {
        SyncConfig {
            version_policy,
            failure_policy,
        }
    }

    async fn sqlite_store() -> Arc<SqliteAuthorStore> {
        Arc::new(SqliteAuthorStore::new(init_in_memory_database().await.unwrap()))
    }

    #[tokio::test]
    async fn test_blank_query_makes_no_calls() {
        let source = StubSource::returning(tolkien_page());
        let store = sqlite_store().await;
        let service = AuthorSearchService::new(source.clone(), store.clone(), &SyncConfig::default());

        let result = service.search(&SearchQuery::new("   ", 10, 0).unwrap()).await;

        assert_eq!(source.calls(), 0);
        assert_eq!(result.status_code, ResponseStatusCode::Success);
        assert_eq!(result.message, MSG_NO_QUERY);
        assert!(result.data.is_empty());
        assert_eq!(result.metadata.total_records, 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_tolkien_scenario() {
        let source = StubSource::returning(tolkien_page());
        let store = sqlite_store().await;
        let service = AuthorSearchService::new(source.clone(), store.clone(), &SyncConfig::default());

        let result = service.search(&SearchQuery::new("tolkien", 10, 0).unwrap()).await;

        let expected = Author {
            id: "OL1A".to_string(),
            name: "J.R.R. Tolkien".to_string(),
            numeric_data: BTreeMap::from([("work_count".to_string(), Number::from(50))]),
            version: 5,
        };
        assert_eq!(source.calls(), 1);
        assert_eq!(result.status_code, ResponseStatusCode::Success);
        assert_eq!(result.message, MSG_FETCHED);
        assert_eq!(result.data, vec![expected.clone()]);
        assert_eq!(result.metadata.total_records, 1);
        assert_eq!(result.metadata.total_pages, 1);
        assert_eq!(result.metadata.current_page, 1);
        assert!(result.error.is_none());
        assert_eq!(store.load_author("OL1A").await.unwrap(), Some(expected));
    }

    #[tokio::test]
    async fn test_remote_failure_is_service_unavailable() {
        let source = StubSource::failing(RemoteError::Network("connection reset".to_string()));
        let store = sqlite_store().await;
        let service = AuthorSearchService::new(source, store.clone(), &SyncConfig::default());

        let result = service.search(&SearchQuery::new("tolkien", 10, 20).unwrap()).await;

        assert_eq!(result.status_code, ResponseStatusCode::ServiceUnavailable);
        assert!(result.data.is_empty());
        assert_eq!(result.metadata, PaginationMetadata::zeroed());
        let error = result.error.expect("error must be populated");
        assert_eq!(error.code, ErrorCode::ApiError);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_malformed_record_is_api_error() {
        let page = AuthorSearchPage {
            docs: vec![doc(json!({ "name": "No Key" }))],
            num_found: 1,
        };
        let service = AuthorSearchService::new(
            StubSource::returning(page),
            sqlite_store().await,
            &SyncConfig::default(),
        );

        let result = service.search(&SearchQuery::new("x", 10, 0).unwrap()).await;

        assert_eq!(result.status_code, ResponseStatusCode::ServiceUnavailable);
        assert_eq!(result.error.unwrap().code, ErrorCode::ApiError);
    }

    #[tokio::test]
    async fn test_lookup_failure_ignored_by_default() {
        let service = AuthorSearchService::new(
            StubSource::returning(tolkien_page()),
            Arc::new(BrokenStore),
            &sync(VersionPolicy::Differs, SyncFailurePolicy::Ignore),
        );

        let result = service.search(&SearchQuery::new("tolkien", 10, 0).unwrap()).await;

        assert!(result.is_success());
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.metadata.total_records, 1);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_lookup_failure_fails_search_when_configured() {
        let service = AuthorSearchService::new(
            StubSource::returning(tolkien_page()),
            Arc::new(BrokenStore),
            &sync(VersionPolicy::Differs, SyncFailurePolicy::Fail),
        );

        let result = service.search(&SearchQuery::new("tolkien", 10, 0).unwrap()).await;

        assert_eq!(result.status_code, ResponseStatusCode::InternalServerError);
        assert!(result.data.is_empty());
        assert_eq!(result.metadata.total_records, 0);
        assert_eq!(result.error.unwrap().code, ErrorCode::DatabaseError);
    }

    #[tokio::test]
    async fn test_write_failure_ignored_by_default() {
        let store = Arc::new(ReadOnlyStore {
            writes: AtomicUsize::new(0),
        });
        let service = AuthorSearchService::new(
            StubSource::returning(tolkien_page()),
            store.clone(),
            &sync(VersionPolicy::Differs, SyncFailurePolicy::Ignore),
        );

        let result = service.search(&SearchQuery::new("tolkien", 10, 0).unwrap()).await;

        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        assert!(result.is_success());
        assert_eq!(result.data.len(), 1);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_write_failure_fails_search_when_configured() {
        let store = Arc::new(ReadOnlyStore {
            writes: AtomicUsize::new(0),
        });
        let service = AuthorSearchService::new(
            StubSource::returning(tolkien_page()),
            store.clone(),
            &sync(VersionPolicy::Differs, SyncFailurePolicy::Fail),
        );

        let result = service.search(&SearchQuery::new("tolkien", 10, 30).unwrap()).await;

        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        assert_eq!(result.status_code, ResponseStatusCode::InternalServerError);
        assert!(result.data.is_empty());
        assert_eq!(result.metadata, PaginationMetadata::zeroed());
        assert_eq!(result.error.unwrap().code, ErrorCode::DatabaseError);
    }

    #[tokio::test]
    async fn test_repeated_key_never_downgrades_under_newer_policy() {
        let page = AuthorSearchPage {
            docs: vec![
                doc(json!({ "key": "OL1A", "name": "Seven", "_version_": "7" })),
                doc(json!({ "key": "OL1A", "name": "Six", "_version_": "6" })),
            ],
            num_found: 2,
        };
        let store = sqlite_store().await;
        let service = AuthorSearchService::new(
            StubSource::returning(page),
            store.clone(),
            &sync(VersionPolicy::Newer, SyncFailurePolicy::Ignore),
        );

        let result = service.search(&SearchQuery::new("x", 10, 0).unwrap()).await;

        // Response keeps both records as fetched
        assert!(result.is_success());
        assert_eq!(result.data.len(), 2);
        let stored = store.load_author("OL1A").await.unwrap().unwrap();
        assert_eq!(stored.version, 7);
        assert_eq!(stored.name, "Seven");
    }

    #[tokio::test]
    async fn test_response_includes_unwritten_authors() {
        let store = sqlite_store().await;
        let service = AuthorSearchService::new(
            StubSource::returning(tolkien_page()),
            store.clone(),
            &SyncConfig::default(),
        );
        let query = SearchQuery::new("tolkien", 10, 0).unwrap();
        service.search(&query).await;

        // Second search: same version, nothing written, still returned
        let again = AuthorSearchService::new(
            StubSource::returning(tolkien_page()),
            store.clone(),
            &SyncConfig::default(),
        );
        let result = again.search(&query).await;

        assert_eq!(result.data.len(), 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_newer_policy_keeps_higher_stored_version() {
        let store = sqlite_store().await;
        store
            .upsert(&[Author {
                id: "OL1A".to_string(),
                name: "Stored".to_string(),
                numeric_data: BTreeMap::new(),
                version: 9,
            }])
            .await
            .unwrap();

        let service = AuthorSearchService::new(
            StubSource::returning(tolkien_page()),
            store.clone(),
            &sync(VersionPolicy::Newer, SyncFailurePolicy::Ignore),
        );
        let result = service.search(&SearchQuery::new("tolkien", 10, 0).unwrap()).await;

        // Caller still sees the fetched record
        assert_eq!(result.data[0].version, 5);
        let stored = store.load_author("OL1A").await.unwrap().unwrap();
        assert_eq!(stored.version, 9);
        assert_eq!(stored.name, "Stored");
    }

    #[tokio::test]
    async fn test_pagination_uses_remote_total() {
        let mut page = tolkien_page();
        page.num_found = 95;
        let service = AuthorSearchService::new(
            StubSource::returning(page),
            sqlite_store().await,
            &SyncConfig::default(),
        );

        let result = service.search(&SearchQuery::new("tolkien", 10, 30).unwrap()).await;

        assert_eq!(result.metadata.total_records, 95);
        assert_eq!(result.metadata.total_pages, 10);
        assert_eq!(result.metadata.current_page, 4);
        assert!(result.metadata.has_next_page);
        assert!(result.metadata.has_previous_page);
    }

    #[tokio::test]
    async fn test_source_order_preserved() {
        let page = AuthorSearchPage {
            docs: vec![
                doc(json!({ "key": "OL3A", "name": "C" })),
                doc(json!({ "key": "OL1A", "name": "A" })),
                doc(json!({ "key": "OL2A", "name": "B" })),
            ],
            num_found: 3,
        };
        let service = AuthorSearchService::new(
            StubSource::returning(page),
            sqlite_store().await,
            &SyncConfig::default(),
        );

        let result = service.search(&SearchQuery::new("x", 10, 0).unwrap()).await;
        let ids: Vec<&str> = result.data.iter().map(|a| a.id.as_str()).collect();

        assert_eq!(ids, vec!["OL3A", "OL1A", "OL2A"]);
    }
}
