//! Strategy contracts.
//!
//! Strategies only return SQL text. They must be pure functions of their
//! arguments so the assembler can deduplicate and cache by name.

use crate::config::Options;
use crate::dialect::Database;
use crate::error::Result;
use crate::model::SearchResultTypeName;
use crate::params::QueryParameters;

/// Produces one named CTE matching against a fulltext index.
pub trait SearchSource: Send + Sync {
    /// Equal names mean equal bodies; only the first body for a name is kept.
    fn cte_name(
        &self,
        dialect: Database,
        source_id: &str,
        query_options: &Options,
        filter_options: &Options,
    ) -> Result<String>;

    /// Body of the CTE, without the `name AS (...)` wrapper.
    fn searching_query_part(
        &self,
        dialect: Database,
        source_id: &str,
        query_options: &Options,
        filter_options: &Options,
    ) -> Result<String>;
}

/// Maps source matches to scored rows of one result type.
///
/// Fragments select at least `result_id, result_type, result_title,
/// result_url, score, meta_data`.
pub trait ResultFilter: Send + Sync {
    fn filter_query_part(
        &self,
        dialect: Database,
        filter_id: &str,
        result_type: &SearchResultTypeName,
        query_options: &Options,
        filter_options: &Options,
    ) -> Result<String>;

    /// Filter-local parameters, already qualified with `filter_id`.
    fn query_parameters(
        &self,
        dialect: Database,
        filter_id: &str,
        filter_options: &Options,
    ) -> Result<QueryParameters>;
}

/// Merges all filter rows of one result type.
pub trait TypeAggregator: Send + Sync {
    /// `limit_parameter` is set only when limits are applied per type; the
    /// returned subquery must then carry exactly one `LIMIT` bound to it.
    fn aggregator_query_part(
        &self,
        dialect: Database,
        result_type: &SearchResultTypeName,
        filter_fragments: &[String],
        query_options: &Options,
        aggregator_options: &Options,
        limit_parameter: Option<&str>,
    ) -> Result<String>;
}

/// Generates the DDL a schema id depends on.
pub trait SchemaStrategy: Send + Sync {
    fn create_schema(&self, dialect: Database, schema_id: &str, options: &Options) -> Result<Vec<String>>;

    fn drop_schema(&self, dialect: Database, schema_id: &str, options: &Options) -> Result<Vec<String>>;
}

/// Re-materializes derived lookup tables of a schema.
pub trait DependencyRefresher: Send + Sync {
    fn refresh_dependencies(
        &self,
        dialect: Database,
        schema_id: &str,
        options: &Options,
    ) -> Result<Vec<String>>;
}
