//! Endpoint and schema configuration.
//!
//! Loaded once, validated on construction and immutable afterwards. Whether a
//! filter's result type has an aggregator is checked when a query is
//! assembled, not here.

mod options;
mod parse;

pub use options::{merge_options, Options, OptionsExt};

use crate::error::{Error, Result};
use crate::model::SearchResultTypeName;
use indexmap::IndexMap;
use serde::Serialize;

/// All endpoints and schemas of one deployment, in declaration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchConfiguration {
    pub endpoints: IndexMap<String, EndpointConfiguration>,
    pub schemas: IndexMap<String, SchemaConfiguration>,
}

impl SearchConfiguration {
    /// Parse the `endpoints` / `schemas` tree. Other top level keys are ignored.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        parse::configuration(value)
    }

    pub fn endpoint(&self, id: &str) -> Result<&EndpointConfiguration> {
        self.endpoints
            .get(id)
            .ok_or_else(|| Error::UnknownEndpoint(id.to_string()))
    }

    pub fn schema(&self, id: &str) -> Result<&SchemaConfiguration> {
        self.schemas
            .get(id)
            .ok_or_else(|| Error::UnknownSchema(id.to_string()))
    }
}

/// One search endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointConfiguration {
    pub id: String,
    pub query_options: Options,
    /// Evaluated in this order.
    pub filters: Vec<ResultFilterConfiguration>,
    pub type_aggregators: IndexMap<SearchResultTypeName, TypeAggregatorConfiguration>,
}

impl EndpointConfiguration {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query_options: Options::new(),
            filters: Vec::new(),
            type_aggregators: IndexMap::new(),
        }
    }

    pub fn with_query_options(mut self, options: Options) -> Self {
        self.query_options = options;
        self
    }

    pub fn with_filter(mut self, filter: ResultFilterConfiguration) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_type_aggregator(mut self, aggregator: TypeAggregatorConfiguration) -> Self {
        self.type_aggregators
            .insert(aggregator.result_type.clone(), aggregator);
        self
    }

    pub fn filter(&self, filter_id: &str) -> Option<&ResultFilterConfiguration> {
        self.filters.iter().find(|f| f.filter_id == filter_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultFilterConfiguration {
    pub filter_id: String,
    /// Registry reference of the filter strategy.
    pub filter: String,
    pub result_type: SearchResultTypeName,
    pub default_parameters: Options,
    /// Source ids, duplicates removed, first occurrence wins.
    pub required_sources: Vec<String>,
    pub filter_options: Options,
}

impl ResultFilterConfiguration {
    pub fn new(
        filter_id: impl Into<String>,
        filter: impl Into<String>,
        result_type: SearchResultTypeName,
    ) -> Self {
        Self {
            filter_id: filter_id.into(),
            filter: filter.into(),
            result_type,
            default_parameters: Options::new(),
            required_sources: Vec::new(),
            filter_options: Options::new(),
        }
    }

    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        let source_id = source_id.into();
        if !self.required_sources.contains(&source_id) {
            self.required_sources.push(source_id);
        }
        self
    }

    pub fn with_default_parameter(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.default_parameters.insert(name.into(), value);
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.filter_options = options;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeAggregatorConfiguration {
    pub result_type: SearchResultTypeName,
    /// Registry reference of the aggregator strategy.
    pub aggregator: String,
    pub aggregator_options: Options,
}

impl TypeAggregatorConfiguration {
    pub fn new(result_type: SearchResultTypeName, aggregator: impl Into<String>) -> Self {
        Self {
            result_type,
            aggregator: aggregator.into(),
            aggregator_options: Options::new(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.aggregator_options = options;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaConfiguration {
    pub schema_id: String,
    /// Registry reference of the schema strategy.
    pub schema: String,
    /// Registry reference of the dependency refresher, if any.
    pub refresher: Option<String>,
    pub options: Options,
}

impl SchemaConfiguration {
    pub fn new(schema_id: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            schema_id: schema_id.into(),
            schema: schema.into(),
            refresher: None,
            options: Options::new(),
        }
    }

    pub fn with_refresher(mut self, refresher: impl Into<String>) -> Self {
        self.refresher = Some(refresher.into());
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }
}
