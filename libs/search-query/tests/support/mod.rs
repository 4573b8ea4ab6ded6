//! Minimal strategies for exercising the composition engine.

#![allow(dead_code)]

use serde_json::{json, Value};
use sift_query::{
    mappers, Database, DependencyRefresher, EndpointConfiguration, Options, OptionsExt,
    QueryParameters, ResultFilter, ResultFilterConfiguration, Result, SchemaStrategy,
    SearchResultTypeName, SearchSource, StrategyRegistry, TypeAggregatorConfiguration,
};

pub fn options(value: Value) -> Options {
    value.as_object().cloned().unwrap_or_default()
}

pub fn type_name(name: &str) -> SearchResultTypeName {
    SearchResultTypeName::new(name).unwrap()
}

/// CTE name of `source_id`: changes with the filter's `variant` option.
pub fn cte_name(source_id: &str, filter_options: &Options) -> Result<String> {
    match filter_options.opt_str("options", "variant")? {
        Some(variant) => Ok(format!("src_{source_id}_{variant}")),
        None => Ok(format!("src_{source_id}")),
    }
}

pub struct TableSource;

impl SearchSource for TableSource {
    fn cte_name(
        &self,
        _dialect: Database,
        source_id: &str,
        _query_options: &Options,
        filter_options: &Options,
    ) -> Result<String> {
        cte_name(source_id, filter_options)
    }

    fn searching_query_part(
        &self,
        _dialect: Database,
        source_id: &str,
        query_options: &Options,
        _filter_options: &Options,
    ) -> Result<String> {
        let language = query_options
            .opt_str("query_options", "language")?
            .unwrap_or("simple");
        Ok(format!(
            "SELECT id AS content_id FROM {source_id} WHERE doc @@ to_tsquery('{language}', :query)"
        ))
    }
}

/// Selects from the CTE of its `source` option and filters on `siteNode`.
pub struct SiteFilter;

impl ResultFilter for SiteFilter {
    fn filter_query_part(
        &self,
        _dialect: Database,
        filter_id: &str,
        result_type: &SearchResultTypeName,
        _query_options: &Options,
        filter_options: &Options,
    ) -> Result<String> {
        let source = filter_options.opt_str("options", "source")?.unwrap_or("s1");
        let cte = cte_name(source, filter_options)?;
        Ok(format!(
            "SELECT c.content_id::text AS result_id, '{result_type}' AS result_type, \
             'title' AS result_title, NULL::text AS result_url, 1.0 AS score, \
             '{{}}'::jsonb AS meta_data \
             FROM {cte} c WHERE (:{filter_id}__siteNode::text IS NULL OR c.site = :{filter_id}__siteNode::text)"
        ))
    }

    fn query_parameters(
        &self,
        _dialect: Database,
        filter_id: &str,
        _filter_options: &Options,
    ) -> Result<QueryParameters> {
        Ok(QueryParameters::new().with(filter_id, "siteNode", mappers::text()))
    }
}

/// Declares no parameter mappers.
pub struct PlainFilter;

impl ResultFilter for PlainFilter {
    fn filter_query_part(
        &self,
        _dialect: Database,
        filter_id: &str,
        result_type: &SearchResultTypeName,
        _query_options: &Options,
        _filter_options: &Options,
    ) -> Result<String> {
        Ok(format!(
            "SELECT c.content_id::text AS result_id, '{result_type}' AS result_type, \
             'title' AS result_title, NULL::text AS result_url, 1.0 AS score, \
             '{{}}'::jsonb AS meta_data FROM src_s1 c WHERE c.tag = :{filter_id}__limit"
        ))
    }

    fn query_parameters(
        &self,
        _dialect: Database,
        _filter_id: &str,
        _filter_options: &Options,
    ) -> Result<QueryParameters> {
        Ok(QueryParameters::new())
    }
}

pub struct LookupSchema;

impl SchemaStrategy for LookupSchema {
    fn create_schema(&self, _dialect: Database, schema_id: &str, _options: &Options) -> Result<Vec<String>> {
        Ok(vec![
            format!("CREATE TABLE IF NOT EXISTS {schema_id}_lookup (content_id text)"),
            format!("CREATE INDEX IF NOT EXISTS {schema_id}_lookup_idx ON {schema_id}_lookup (content_id)"),
        ])
    }

    fn drop_schema(&self, _dialect: Database, schema_id: &str, _options: &Options) -> Result<Vec<String>> {
        Ok(vec![
            format!("DROP INDEX IF EXISTS {schema_id}_lookup_idx"),
            format!("DROP TABLE IF EXISTS {schema_id}_lookup"),
        ])
    }
}

pub struct LookupRefresher;

impl DependencyRefresher for LookupRefresher {
    fn refresh_dependencies(
        &self,
        _dialect: Database,
        schema_id: &str,
        _options: &Options,
    ) -> Result<Vec<String>> {
        Ok(vec![format!("TRUNCATE {schema_id}_lookup")])
    }
}

pub fn registry() -> StrategyRegistry {
    let mut registry = StrategyRegistry::new();
    registry
        .register_source("s1", || TableSource)
        .register_source("s2", || TableSource)
        .register_filter("site", || SiteFilter)
        .register_filter("plain", || PlainFilter)
        .register_schema("lookup", || LookupSchema)
        .register_refresher("lookup", || LookupRefresher);
    registry
}

pub fn filter(filter_id: &str, strategy: &str, result_type: &str, sources: &[&str]) -> ResultFilterConfiguration {
    sources.iter().fold(
        ResultFilterConfiguration::new(filter_id, strategy, type_name(result_type)),
        |filter, source| filter.with_source(*source),
    )
}

pub fn aggregator(result_type: &str) -> TypeAggregatorConfiguration {
    TypeAggregatorConfiguration::new(type_name(result_type), "default")
}

/// Scenario 1: one source, one filter, one aggregator.
pub fn single_filter_endpoint() -> EndpointConfiguration {
    EndpointConfiguration::new("site")
        .with_query_options(options(json!({"language": "simple"})))
        .with_filter(filter("f1", "site", "T", &["s1"]))
        .with_type_aggregator(aggregator("T"))
}
