//! OpenLibrary author search client
//!
//! One outbound request per call, no retries. Transport failures, non-2xx
//! statuses, timeouts, and undecodable bodies all surface as [`RemoteError`];
//! a call never returns a partial page.

use async_trait::async_trait;
use reqwest::Url;
use shelf_common::config::OpenLibraryConfig;
use std::time::Duration;

use crate::error::RemoteError;
use crate::models::AuthorSearchPage;

/// Source of raw author search results
#[async_trait]
pub trait AuthorSource: Send + Sync {
    /// Fetch one page of raw records matching `query`
    async fn fetch(
        &self,
        query: &str,
        limit: u32,
        offset: u64,
    ) -> Result<AuthorSearchPage, RemoteError>;
}

/// OpenLibrary API client
pub struct OpenLibraryClient {
    http_client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl OpenLibraryClient {
    pub fn new(config: &OpenLibraryConfig) -> Result<Self, RemoteError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| RemoteError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            timeout: config.timeout(),
        })
    }

    /// Request URL with `q`, `limit`, and `offset` parameters
    pub fn search_url(&self, query: &str, limit: u32, offset: u64) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        url
    }

    fn classify(&self, err: reqwest::Error) -> RemoteError {
        if err.is_timeout() {
            RemoteError::Timeout(self.timeout)
        } else {
            RemoteError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl AuthorSource for OpenLibraryClient {
    async fn fetch(
        &self,
        query: &str,
        limit: u32,
        offset: u64,
    ) -> Result<AuthorSearchPage, RemoteError> {
        let url = self.search_url(query, limit, offset);
        tracing::debug!(url = %url, "Querying OpenLibrary author search");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status(status.as_u16(), error_text));
        }

        let page: AuthorSearchPage = response.json().await.map_err(|e| {
            if e.is_timeout() {
                RemoteError::Timeout(self.timeout)
            } else {
                RemoteError::Parse(e.to_string())
            }
        })?;

        tracing::info!(
            query = %query,
            num_found = page.num_found,
            returned = page.docs.len(),
            "Retrieved authors from OpenLibrary"
        );

        Ok(page)
    }
}
