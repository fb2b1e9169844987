//! Selects which fetched authors need writing
//!
//! One batched version lookup per call. A candidate is kept when no row
//! exists for its id, or when its version passes the configured
//! [`VersionPolicy`] against the stored one.
//!
//! Repeated ids within a batch are collapsed first so the batched upsert never
//! sees two rows for the same key.

use shelf_common::config::VersionPolicy;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::AuthorStore;
use crate::error::StoreError;
use crate::models::Author;

pub struct VersionReconciler {
    store: Arc<dyn AuthorStore>,
    policy: VersionPolicy,
}

impl VersionReconciler {
    pub fn new(store: Arc<dyn AuthorStore>, policy: VersionPolicy) -> Self {
        Self { store, policy }
    }

    /// Candidates that are new or whose version changed, at most one per id,
    /// ordered by first appearance of each id.
    ///
    /// A lookup failure aborts the whole reconciliation; nothing is returned
    /// for partial application.
    pub async fn filter_needing_update(
        &self,
        candidates: &[Author],
    ) -> Result<Vec<Author>, StoreError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let unique = collapse_duplicates(self.policy, candidates);
        let ids: Vec<String> = unique.iter().map(|a| a.id.clone()).collect();
        let stored = self.store.fetch_versions(&ids).await?;

        let stale: Vec<Author> = unique
            .into_iter()
            .filter(|author| match stored.get(&author.id) {
                None => true,
                Some(&stored_version) => needs_update(self.policy, author.version, stored_version),
            })
            .cloned()
            .collect();

        tracing::debug!(
            candidates = candidates.len(),
            known = stored.len(),
            stale = stale.len(),
            "Reconciled author versions"
        );

        Ok(stale)
    }
}

/// One candidate per id: highest version under `Newer` (last wins on ties),
/// last in source order under `Differs`
fn collapse_duplicates(policy: VersionPolicy, candidates: &[Author]) -> Vec<&Author> {
    let mut slots: HashMap<&str, usize> = HashMap::with_capacity(candidates.len());
    let mut unique: Vec<&Author> = Vec::with_capacity(candidates.len());

    for author in candidates {
        match slots.get(author.id.as_str()) {
            None => {
                slots.insert(author.id.as_str(), unique.len());
                unique.push(author);
            }
            Some(&slot) => {
                let replace = match policy {
                    VersionPolicy::Differs => true,
                    VersionPolicy::Newer => author.version >= unique[slot].version,
                };
                if replace {
                    unique[slot] = author;
                }
            }
        }
    }

    unique
}

fn needs_update(policy: VersionPolicy, incoming: u64, stored: u64) -> bool {
    match policy {
        VersionPolicy::Differs => incoming != stored,
        VersionPolicy::Newer => incoming > stored,
    }
}
