//! Database access for shelf-search

pub mod authors;

pub use authors::{AuthorStore, SqliteAuthorStore};
