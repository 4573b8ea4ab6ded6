//! PostgreSQL adapter for sift
//!
//! Binds [`sift_query::PreparedSearch`] values with `sqlx`, maps result rows to
//! [`sift_query::SearchResult`] and applies schema scripts.

pub mod error;
mod script;
mod store;

pub use error::{Error, Result};
pub use store::PgSearchStore;
