//! Validation of the raw configuration tree.

use super::{
    EndpointConfiguration, OptionsExt, Options, ResultFilterConfiguration, SchemaConfiguration,
    SearchConfiguration, TypeAggregatorConfiguration,
};
use crate::error::{Error, Result};
use crate::model::SearchResultTypeName;
use crate::params::describe;
use crate::sql::is_identifier;
use serde_json::Value as JsonValue;

const ENDPOINT_KEYS: &[&str] = &["query_options", "filters", "type_aggregators"];
const FILTER_KEYS: &[&str] = &["filter", "result_type", "default_parameters", "sources", "options"];
const AGGREGATOR_KEYS: &[&str] = &["aggregator", "options"];
const SCHEMA_KEYS: &[&str] = &["schema", "class", "refresher", "options"];

pub(super) fn configuration(value: &JsonValue) -> Result<SearchConfiguration> {
    let root = object(value, "")?;
    let mut config = SearchConfiguration::default();

    if let Some(endpoints) = child_object(root, "", "endpoints")? {
        for (id, raw) in endpoints {
            let path = format!("endpoints.{id}");
            config.endpoints.insert(id.clone(), endpoint(id, raw, &path)?);
        }
    }
    if let Some(schemas) = child_object(root, "", "schemas")? {
        for (id, raw) in schemas {
            let path = format!("schemas.{id}");
            config.schemas.insert(id.clone(), schema(id, raw, &path)?);
        }
    }

    tracing::debug!(
        endpoints = config.endpoints.len(),
        schemas = config.schemas.len(),
        "parsed search configuration"
    );
    Ok(config)
}

fn endpoint(id: &str, raw: &JsonValue, path: &str) -> Result<EndpointConfiguration> {
    let map = object(raw, path)?;
    reject_unknown_keys(map, path, ENDPOINT_KEYS)?;

    let mut endpoint = EndpointConfiguration::new(id);
    endpoint.query_options = map
        .opt_object(path, "query_options")?
        .cloned()
        .unwrap_or_default();

    if let Some(filters) = child_object(map, path, "filters")? {
        for (filter_id, raw) in filters {
            let filter_path = format!("{path}.filters.{filter_id}");
            endpoint.filters.push(filter(filter_id, raw, &filter_path)?);
        }
    }

    if let Some(aggregators) = child_object(map, path, "type_aggregators")? {
        for (type_name, raw) in aggregators {
            let aggregator_path = format!("{path}.type_aggregators.{type_name}");
            let result_type = SearchResultTypeName::new(type_name.clone())
                .map_err(|e| Error::config(&aggregator_path, e.to_string()))?;
            let aggregator = type_aggregator(result_type, raw, &aggregator_path)?;
            endpoint
                .type_aggregators
                .insert(aggregator.result_type.clone(), aggregator);
        }
    }

    Ok(endpoint)
}

fn filter(filter_id: &str, raw: &JsonValue, path: &str) -> Result<ResultFilterConfiguration> {
    if !is_identifier(filter_id) {
        return Err(Error::config(
            path,
            format!("filter id '{filter_id}' must match [A-Za-z_][A-Za-z0-9_]*"),
        ));
    }
    let map = object(raw, path)?;
    reject_unknown_keys(map, path, FILTER_KEYS)?;

    let strategy = map.require_str(path, "filter")?;
    let type_name = map.require_str(path, "result_type")?;
    let result_type = SearchResultTypeName::new(type_name)
        .map_err(|e| Error::config(format!("{path}.result_type"), e.to_string()))?;

    let mut filter = ResultFilterConfiguration::new(filter_id, strategy, result_type);
    filter.default_parameters = map
        .opt_object(path, "default_parameters")?
        .cloned()
        .unwrap_or_default();
    filter.filter_options = map.opt_object(path, "options")?.cloned().unwrap_or_default();
    for source_id in map.opt_string_list(path, "sources")? {
        filter = filter.with_source(source_id);
    }
    Ok(filter)
}

fn type_aggregator(
    result_type: SearchResultTypeName,
    raw: &JsonValue,
    path: &str,
) -> Result<TypeAggregatorConfiguration> {
    let map = object(raw, path)?;
    reject_unknown_keys(map, path, AGGREGATOR_KEYS)?;

    let aggregator = map.opt_str(path, "aggregator")?.unwrap_or("default");
    let options = map.opt_object(path, "options")?.cloned().unwrap_or_default();
    Ok(TypeAggregatorConfiguration::new(result_type, aggregator).with_options(options))
}

fn schema(schema_id: &str, raw: &JsonValue, path: &str) -> Result<SchemaConfiguration> {
    let map = object(raw, path)?;
    reject_unknown_keys(map, path, SCHEMA_KEYS)?;

    let strategy = match (map.opt_str(path, "schema")?, map.opt_str(path, "class")?) {
        (Some(s), None) | (None, Some(s)) => s,
        (Some(_), Some(_)) => {
            return Err(Error::config(path, "set either 'schema' or 'class', not both"));
        }
        (None, None) => {
            return Err(Error::config(format!("{path}.schema"), "missing required value"));
        }
    };

    let mut schema = SchemaConfiguration::new(schema_id, strategy);
    schema.refresher = map.opt_str(path, "refresher")?.map(str::to_string);
    schema.options = map.opt_object(path, "options")?.cloned().unwrap_or_default();
    Ok(schema)
}

fn object<'a>(value: &'a JsonValue, path: &str) -> Result<&'a Options> {
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(Error::InvalidValue {
            path: if path.is_empty() { "<root>".to_string() } else { path.to_string() },
            expected: "object",
            observed: describe(other),
        }),
    }
}

fn child_object<'a>(map: &'a Options, path: &str, key: &str) -> Result<Option<&'a Options>> {
    map.opt_object(path, key)
}

fn reject_unknown_keys(map: &Options, path: &str, allowed: &[&str]) -> Result<()> {
    match map.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(key) => Err(Error::config(
            format!("{path}.{key}"),
            format!("unknown key (expected one of: {})", allowed.join(", ")),
        )),
        None => Ok(()),
    }
}
