//! Composition engine for multi-source fulltext search queries
//!
//! Sources, filters and type aggregators are pluggable strategies resolved
//! through a [`StrategyRegistry`]. The [`QueryAssembler`] walks an endpoint
//! configuration and produces a [`SearchQuery`], which renders to one SQL
//! statement with named placeholders and binds a [`SearchInput`] into a
//! [`PreparedSearch`]. The [`SchemaTool`] produces the DDL those queries
//! depend on. Nothing in this crate performs I/O.

#![allow(clippy::too_many_arguments)]

pub mod aggregator;
pub mod api;
pub mod config;
pub mod dialect;
pub mod error;
pub mod model;
pub mod params;
pub mod query;
pub mod registry;
pub mod schema;
pub mod sql;
pub mod strategy;

pub use aggregator::DefaultTypeAggregator;
pub use api::SearchApi;
pub use config::{
    merge_options, EndpointConfiguration, Options, OptionsExt, ResultFilterConfiguration,
    SchemaConfiguration, SearchConfiguration, TypeAggregatorConfiguration,
};
pub use dialect::{Bucket, BucketWeights, Database, SqlType};
pub use error::{Error, Result};
pub use model::{SearchResult, SearchResultTypeName, SearchResults};
pub use params::{mappers, BindValue, QueryParameters, ValueMapper};
pub use query::{
    BoundParameter, LimitMode, PreparedSearch, QueryAssembler, ResultLimit, SearchInput,
    SearchQuery,
};
pub use registry::{StrategyKind, StrategyRegistry, DEFAULT_AGGREGATOR};
pub use schema::{SchemaScript, SchemaSection, SchemaTool, SchemaVerb};
pub use sql::TrustedSql;
pub use strategy::{DependencyRefresher, ResultFilter, SchemaStrategy, SearchSource, TypeAggregator};
