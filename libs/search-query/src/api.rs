//! Entry point tying configuration, registry and dialect together.

use crate::config::{EndpointConfiguration, Options, SchemaConfiguration, SearchConfiguration};
use crate::dialect::Database;
use crate::error::Result;
use crate::query::{LimitMode, PreparedSearch, QueryAssembler, SearchInput, SearchQuery};
use crate::registry::StrategyRegistry;
use crate::schema::SchemaTool;
use std::sync::Arc;

/// Shared, read-only search service state.
#[derive(Debug, Clone)]
pub struct SearchApi {
    dialect: Database,
    registry: Arc<StrategyRegistry>,
    configuration: Arc<SearchConfiguration>,
}

impl SearchApi {
    pub fn new(
        dialect: Database,
        registry: Arc<StrategyRegistry>,
        configuration: Arc<SearchConfiguration>,
    ) -> Self {
        Self {
            dialect,
            registry,
            configuration,
        }
    }

    pub fn dialect(&self) -> Database {
        self.dialect
    }

    /// Same state, different dialect.
    pub fn with_dialect(&self, dialect: Database) -> Self {
        Self {
            dialect,
            ..self.clone()
        }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn configuration(&self) -> &SearchConfiguration {
        &self.configuration
    }

    pub fn endpoint(&self, endpoint_id: &str) -> Result<&EndpointConfiguration> {
        self.configuration.endpoint(endpoint_id)
    }

    pub fn schema(&self, schema_id: &str) -> Result<&SchemaConfiguration> {
        self.configuration.schema(schema_id)
    }

    /// Assemble the query of one endpoint.
    pub fn search_query(
        &self,
        endpoint_id: &str,
        overrides: Option<&Options>,
        limit_mode: LimitMode,
    ) -> Result<SearchQuery> {
        let endpoint = self.configuration.endpoint(endpoint_id)?;
        QueryAssembler::new(self.dialect, &self.registry).assemble(endpoint, overrides, limit_mode)
    }

    /// Assemble and bind in one step, using the limit mode of `input`.
    pub fn prepare_search(
        &self,
        endpoint_id: &str,
        overrides: Option<&Options>,
        input: &SearchInput,
    ) -> Result<PreparedSearch> {
        self.search_query(endpoint_id, overrides, input.limit().mode())?
            .prepare(input)
    }

    pub fn schema_tool(&self) -> SchemaTool<'_> {
        SchemaTool::new(self.dialect, &self.registry, &self.configuration.schemas)
    }
}
