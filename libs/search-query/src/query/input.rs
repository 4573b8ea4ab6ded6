//! Per-request search input and parameter binding.

use super::{LimitMode, SearchQuery};
use crate::config::Options;
use crate::error::{Error, Result};
use crate::model::SearchResultTypeName;
use crate::params::{qualified_name, BindValue, GLOBAL_LIMIT_PARAMETER, QUERY_PARAMETER};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

/// How many results to return.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultLimit {
    Global(i64),
    PerType(IndexMap<SearchResultTypeName, i64>),
}

impl ResultLimit {
    pub fn mode(&self) -> LimitMode {
        match self {
            Self::Global(_) => LimitMode::Global,
            Self::PerType(_) => LimitMode::PerType,
        }
    }
}

/// One search request: the end-user query, per-filter parameters and limits.
#[derive(Debug, Clone)]
pub struct SearchInput {
    query: String,
    /// filter id -> local parameter name -> raw value
    parameters: IndexMap<String, Options>,
    limit: ResultLimit,
}

impl SearchInput {
    pub fn new(query: impl Into<String>, limit: ResultLimit) -> Self {
        Self {
            query: query.into(),
            parameters: IndexMap::new(),
            limit,
        }
    }

    pub fn with_global_limit(query: impl Into<String>, limit: i64) -> Self {
        Self::new(query, ResultLimit::Global(limit))
    }

    pub fn with_type_limits(
        query: impl Into<String>,
        limits: IndexMap<SearchResultTypeName, i64>,
    ) -> Self {
        Self::new(query, ResultLimit::PerType(limits))
    }

    pub fn with_parameter(
        mut self,
        filter_id: impl Into<String>,
        name: impl Into<String>,
        value: JsonValue,
    ) -> Self {
        self.parameters
            .entry(filter_id.into())
            .or_default()
            .insert(name.into(), value);
        self
    }

    /// Merge all parameters of one filter.
    pub fn with_filter_parameters(mut self, filter_id: impl Into<String>, values: Options) -> Self {
        self.parameters.entry(filter_id.into()).or_default().extend(values);
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn limit(&self) -> &ResultLimit {
        &self.limit
    }

    pub fn parameters(&self) -> &IndexMap<String, Options> {
        &self.parameters
    }
}

/// A parameter bound at one position.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    pub name: String,
    pub value: BindValue,
}

/// Positional SQL plus the values for each position, ready for the driver.
#[derive(Debug, Clone)]
pub struct PreparedSearch {
    sql: String,
    parameters: Vec<BoundParameter>,
}

impl PreparedSearch {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// `parameters()[i]` binds position `i + 1`.
    pub fn parameters(&self) -> &[BoundParameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&BindValue> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

impl SearchQuery {
    /// Render, rewrite placeholders and bind `input`.
    ///
    /// Defaults are overridden by explicit per-filter parameters; reserved
    /// parameters always come from the input. Value mappers run here.
    pub fn prepare(&self, input: &SearchInput) -> Result<PreparedSearch> {
        let requested = input.limit.mode();
        if requested != self.limit_mode {
            return Err(Error::LimitModeMismatch {
                assembled: self.limit_mode,
                requested,
            });
        }

        let mut type_limits: IndexMap<String, i64> = IndexMap::new();
        if let ResultLimit::PerType(limits) = &input.limit {
            for result_type in &self.result_types {
                let limit = limits
                    .get(result_type)
                    .ok_or_else(|| Error::MissingTypeLimit(result_type.to_string()))?;
                type_limits.insert(result_type.limit_parameter(), *limit);
            }
        }

        let mut raw_values = self.default_parameters.clone();
        let mut undeclared = Vec::new();
        for (filter_id, values) in &input.parameters {
            for (local_name, value) in values {
                let name = qualified_name(filter_id, local_name);
                if !raw_values.contains_key(&name) && !self.parameter_mappers.contains(&name) {
                    undeclared.push(name.clone());
                }
                raw_values.insert(name, value.clone());
            }
        }

        let sql = self.sql()?;
        let positional = self.dialect.positional_placeholders(&sql)?;

        // Every explicit value must be declared or referenced by a filter.
        if let Some(name) = undeclared
            .into_iter()
            .find(|name| !positional.names.contains(name))
        {
            tracing::warn!(parameter = %name, endpoint = %self.endpoint_id, "Undeclared search parameter");
            return Err(Error::UndeclaredParameter(name));
        }

        let mut parameters = Vec::with_capacity(positional.names.len());
        for name in positional.names {
            let value = if name == QUERY_PARAMETER {
                BindValue::Text(Some(self.dialect.search_term(&input.query)?))
            } else if name == GLOBAL_LIMIT_PARAMETER {
                match &input.limit {
                    ResultLimit::Global(limit) => BindValue::Integer(Some(*limit)),
                    ResultLimit::PerType(_) => {
                        return Err(Error::LimitModeMismatch {
                            assembled: LimitMode::Global,
                            requested,
                        });
                    }
                }
            } else if let Some(limit) = type_limits.get(&name) {
                BindValue::Integer(Some(*limit))
            } else {
                let raw = raw_values.get(&name);
                match self.parameter_mappers.get(&name) {
                    Some(mapper) => mapper(raw).map_err(|message| Error::InvalidParameterValue {
                        name: name.clone(),
                        message,
                    })?,
                    None => BindValue::infer(raw),
                }
            };
            parameters.push(BoundParameter { name, value });
        }

        Ok(PreparedSearch {
            sql: positional.sql,
            parameters,
        })
    }
}
