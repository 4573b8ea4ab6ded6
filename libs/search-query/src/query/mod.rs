//! Assembled search queries.
//!
//! A [`SearchQuery`] is the structured result of walking one endpoint
//! configuration: ordered CTEs, one merging fragment per result type, default
//! parameters and value mappers. Rendering it to SQL text is a separate step.

mod assembler;
mod input;
mod render;

pub use assembler::QueryAssembler;
pub use input::{BoundParameter, PreparedSearch, ResultLimit, SearchInput};
pub use render::ALL_RESULTS_CTE;

use crate::config::Options;
use crate::dialect::Database;
use crate::error::Result;
use crate::model::SearchResultTypeName;
use crate::params::QueryParameters;
use indexmap::IndexMap;
use std::fmt;

/// Where result limits are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitMode {
    /// One `LIMIT :global_limit` on the merged result set.
    Global,
    /// One `LIMIT :limit_<type>` inside every type aggregator subquery.
    PerType,
}

impl fmt::Display for LimitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Global => "global",
            Self::PerType => "per-type",
        })
    }
}

/// An assembled, immutable search query.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    dialect: Database,
    endpoint_id: String,
    limit_mode: LimitMode,
    result_types: Vec<SearchResultTypeName>,
    source_fragments: IndexMap<String, String>,
    merging_fragments: Vec<String>,
    default_parameters: Options,
    parameter_mappers: QueryParameters,
}

impl SearchQuery {
    pub fn dialect(&self) -> Database {
        self.dialect
    }

    pub fn endpoint_id(&self) -> &str {
        &self.endpoint_id
    }

    pub fn limit_mode(&self) -> LimitMode {
        self.limit_mode
    }

    /// Result types in the order filters first produced them.
    pub fn result_types(&self) -> &[SearchResultTypeName] {
        &self.result_types
    }

    /// CTE name -> body, in first-use order.
    pub fn source_fragments(&self) -> &IndexMap<String, String> {
        &self.source_fragments
    }

    /// One subquery per aggregated result type, in aggregator order.
    pub fn merging_fragments(&self) -> &[String] {
        &self.merging_fragments
    }

    /// Default values under fully-qualified parameter names.
    pub fn default_parameters(&self) -> &Options {
        &self.default_parameters
    }

    pub fn parameter_mappers(&self) -> &QueryParameters {
        &self.parameter_mappers
    }

    /// Final SQL with named (`:name`) placeholders.
    pub fn sql(&self) -> Result<String> {
        render::render(self)
    }
}
