//! Search pipeline services

pub mod author_search;
pub mod openlibrary_client;
pub mod record_mapper;
pub mod version_reconciler;

pub use author_search::AuthorSearchService;
pub use openlibrary_client::{AuthorSource, OpenLibraryClient};
pub use record_mapper::map_author;
pub use version_reconciler::VersionReconciler;
