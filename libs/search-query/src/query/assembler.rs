use super::{LimitMode, SearchQuery};
use crate::config::{merge_options, EndpointConfiguration, Options, ResultFilterConfiguration};
use crate::dialect::Database;
use crate::error::{Error, Result};
use crate::model::SearchResultTypeName;
use crate::params::{qualified_name, QueryParameters};
use crate::registry::StrategyRegistry;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Walks an endpoint configuration and builds a [`SearchQuery`].
///
/// Assembly is pure: it resolves strategies and collects SQL text, but never
/// touches parameter values or the database.
pub struct QueryAssembler<'a> {
    dialect: Database,
    registry: &'a StrategyRegistry,
}

impl<'a> QueryAssembler<'a> {
    pub fn new(dialect: Database, registry: &'a StrategyRegistry) -> Self {
        Self { dialect, registry }
    }

    /// Assemble `endpoint`, with `overrides` merged over its query options.
    pub fn assemble(
        &self,
        endpoint: &EndpointConfiguration,
        overrides: Option<&Options>,
        limit_mode: LimitMode,
    ) -> Result<SearchQuery> {
        let dialect = self.dialect;
        let query_options = match overrides {
            Some(overrides) => merge_options(&endpoint.query_options, overrides),
            None => endpoint.query_options.clone(),
        };

        let mut source_fragments: IndexMap<String, String> = IndexMap::new();
        let mut fragments_by_type: IndexMap<SearchResultTypeName, Vec<String>> = IndexMap::new();
        let mut default_parameters = Options::new();
        let mut default_owners: HashMap<String, &str> = HashMap::new();
        let mut parameter_mappers = QueryParameters::new();
        let mut mapper_owners: HashMap<String, &str> = HashMap::new();

        for filter in &endpoint.filters {
            let filter_id = filter.filter_id.as_str();

            for source_id in &filter.required_sources {
                let source = self.registry.source(source_id)?;
                let cte_name = source
                    .cte_name(dialect, source_id, &query_options, &filter.filter_options)
                    .map_err(|e| qualify(e, endpoint, Some(filter)))?;
                if source_fragments.contains_key(&cte_name) {
                    tracing::debug!(filter_id, source_id, cte = %cte_name, "Reusing source CTE");
                    continue;
                }
                let body = source
                    .searching_query_part(dialect, source_id, &query_options, &filter.filter_options)
                    .map_err(|e| qualify(e, endpoint, Some(filter)))?;
                tracing::debug!(filter_id, source_id, cte = %cte_name, "Adding source CTE");
                source_fragments.insert(cte_name, body);
            }

            let strategy = self.registry.filter(&filter.filter)?;

            if !fragments_by_type.contains_key(&filter.result_type) {
                if !endpoint.type_aggregators.contains_key(&filter.result_type) {
                    return Err(Error::MissingTypeAggregator(filter.result_type.to_string()));
                }
                fragments_by_type.insert(filter.result_type.clone(), Vec::new());
            }

            for (local_name, value) in &filter.default_parameters {
                let name = qualified_name(filter_id, local_name);
                if let Some(first) = default_owners.get(&name) {
                    return Err(Error::DuplicateParameter {
                        name,
                        first_filter: first.to_string(),
                        second_filter: filter_id.to_string(),
                    });
                }
                default_owners.insert(name.clone(), filter_id);
                default_parameters.insert(name, value.clone());
            }

            let declared = strategy
                .query_parameters(dialect, filter_id, &filter.filter_options)
                .map_err(|e| qualify(e, endpoint, Some(filter)))?;
            for (name, mapper) in declared.iter() {
                if let Some(first) = mapper_owners.get(name) {
                    return Err(Error::DuplicateParameter {
                        name: name.clone(),
                        first_filter: first.to_string(),
                        second_filter: filter_id.to_string(),
                    });
                }
                mapper_owners.insert(name.clone(), filter_id);
                parameter_mappers.insert(name.clone(), mapper.clone());
            }

            let fragment = strategy
                .filter_query_part(
                    dialect,
                    filter_id,
                    &filter.result_type,
                    &query_options,
                    &filter.filter_options,
                )
                .map_err(|e| qualify(e, endpoint, Some(filter)))?;
            if let Some(fragments) = fragments_by_type.get_mut(&filter.result_type) {
                fragments.push(fragment);
            }
        }

        if source_fragments.is_empty() {
            return Err(Error::NoSourceFragments(endpoint.id.clone()));
        }
        if fragments_by_type.is_empty() {
            return Err(Error::NoResultTypes(endpoint.id.clone()));
        }

        let mut merging_fragments = Vec::with_capacity(fragments_by_type.len());
        for (result_type, aggregator_config) in &endpoint.type_aggregators {
            let Some(fragments) = fragments_by_type.get(result_type) else {
                tracing::debug!(
                    endpoint = %endpoint.id,
                    result_type = %result_type,
                    "Skipping type aggregator without filters"
                );
                continue;
            };
            let aggregator = self.registry.aggregator(&aggregator_config.aggregator)?;
            let limit_parameter = match limit_mode {
                LimitMode::PerType => Some(result_type.limit_parameter()),
                LimitMode::Global => None,
            };
            let fragment = aggregator
                .aggregator_query_part(
                    dialect,
                    result_type,
                    fragments,
                    &query_options,
                    &aggregator_config.aggregator_options,
                    limit_parameter.as_deref(),
                )
                .map_err(|e| qualify(e, endpoint, None))?;
            merging_fragments.push(fragment);
        }

        tracing::debug!(
            endpoint = %endpoint.id,
            sources = source_fragments.len(),
            result_types = fragments_by_type.len(),
            parameters = parameter_mappers.len(),
            %limit_mode,
            "Assembled search query"
        );

        Ok(SearchQuery {
            dialect,
            endpoint_id: endpoint.id.clone(),
            limit_mode,
            result_types: fragments_by_type.into_keys().collect(),
            source_fragments,
            merging_fragments,
            default_parameters,
            parameter_mappers,
        })
    }
}

/// Anchor a configuration error raised by a strategy at the endpoint.
///
/// Strategies report paths relative to what they were given: `sources.<id>...`
/// for effective source options, `options...` or `filters.<id>.options...`
/// for filter options, `query_options...` and `type_aggregators...` as is.
/// Source options are attributed to the filter when it sets the offending key.
fn qualify(err: Error, endpoint: &EndpointConfiguration, filter: Option<&ResultFilterConfiguration>) -> Error {
    err.map_config_path(|path| {
        let base = format!("endpoints.{}", endpoint.id);
        if path.starts_with("endpoints.") {
            return path.to_string();
        }
        if let Some(filter) = filter {
            let filter_base = format!("{base}.filters.{}", filter.filter_id);
            if let Some(rest) = path.strip_prefix("sources.") {
                let mut segments = rest.split('.');
                let source_id = segments.next().unwrap_or_default();
                let key = segments.next().unwrap_or_default();
                let set_by_filter = filter
                    .filter_options
                    .get("sources")
                    .and_then(|sources| sources.get(source_id))
                    .and_then(|options| options.get(key))
                    .is_some();
                return if set_by_filter {
                    format!("{filter_base}.options.{path}")
                } else {
                    format!("{base}.query_options.{path}")
                };
            }
            if path == "options" || path.starts_with("options.") {
                return format!("{filter_base}.{path}");
            }
        }
        format!("{base}.{path}")
    })
}
