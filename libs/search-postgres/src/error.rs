//! Error types for the PostgreSQL adapter

use sift_query::SchemaVerb;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Query(#[from] sift_query::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A schema script failed part way; `applied` statements were committed.
    #[error(
        "{verb} schema '{schema_id}' failed at statement {statement_index} \
         after {applied} applied statement(s): {source}"
    )]
    ScriptAborted {
        schema_id: String,
        verb: SchemaVerb,
        statement_index: usize,
        applied: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid result row: {0}")]
    InvalidRow(String),
}
