//! Fulltext search over a generic content table
//!
//! A `content` schema adds a weighted, generated `tsvector` column (with
//! HTML headings promoted to the critical and major buckets), a GIN index
//! and optionally a derived lookup table. The `content` source matches and
//! ranks against that column; the `content` filter joins matches back to the
//! content or lookup table and applies typed, nullable parameters.

pub mod filter;
pub mod naming;
pub mod refresher;
pub mod schema;
pub mod source;

pub use filter::{ContentFilter, ContentFilterOptions, ParameterKind};
pub use naming::SchemaNames;
pub use refresher::LookupRefresher;
pub use schema::{ColumnSpec, ContentSchema, ContentSchemaOptions};
pub use source::{ContentSource, SourceSettings};

use sift_query::StrategyRegistry;

/// Registry reference of the source, filter and schema strategies.
pub const CONTENT: &str = "content";

/// Registry reference of the lookup refresher.
pub const CONTENT_LOOKUP: &str = "content-lookup";

/// Register all content strategies.
pub fn register(registry: &mut StrategyRegistry) {
    registry
        .register_source(CONTENT, || ContentSource)
        .register_filter(CONTENT, || ContentFilter)
        .register_schema(CONTENT, || ContentSchema)
        .register_refresher(CONTENT_LOOKUP, || LookupRefresher);
}
