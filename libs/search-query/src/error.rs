//! Error types for search query composition

use crate::dialect::Database;
use crate::query::LimitMode;
use crate::registry::StrategyKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration at '{path}': {message}")]
    InvalidConfiguration { path: String, message: String },

    #[error("invalid configuration at '{path}': expected {expected}, found {observed}")]
    InvalidValue {
        path: String,
        expected: &'static str,
        observed: String,
    },

    #[error("invalid search result type name '{0}' (expected [A-Za-z_][A-Za-z0-9_]*)")]
    InvalidResultTypeName(String),

    #[error("invalid SQL identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("unknown {kind} strategy '{reference}'")]
    UnknownStrategy {
        kind: StrategyKind,
        reference: String,
    },

    #[error("endpoint '{0}' is not configured")]
    UnknownEndpoint(String),

    #[error("schema '{0}' is not configured")]
    UnknownSchema(String),

    #[error("schema filter does not point to an existing configuration: '{0}'")]
    SchemaFilterMismatch(String),

    #[error("{operation} is not implemented for database '{dialect}'")]
    NotImplemented {
        dialect: Database,
        operation: &'static str,
    },

    #[error("unsupported database '{0}'")]
    UnsupportedDatabase(String),

    #[error("duplicate parameter '{name}' declared by filters '{first_filter}' and '{second_filter}'")]
    DuplicateParameter {
        name: String,
        first_filter: String,
        second_filter: String,
    },

    #[error("no type aggregator for search result type {0}")]
    MissingTypeAggregator(String),

    #[error("endpoint '{0}' produced no source fragments")]
    NoSourceFragments(String),

    #[error("endpoint '{0}' produced no result type groups")]
    NoResultTypes(String),

    #[error("no result limit given for search result type {0}")]
    MissingTypeLimit(String),

    #[error("query was assembled for {assembled} limits but the search requested {requested} limits")]
    LimitModeMismatch {
        assembled: LimitMode,
        requested: LimitMode,
    },

    #[error("parameter '{0}' is not declared by any filter of the endpoint")]
    UndeclaredParameter(String),

    #[error("invalid value for parameter '{name}': {message}")]
    InvalidParameterValue { name: String, message: String },

    #[error("strategy error in '{strategy}': {message}")]
    Strategy { strategy: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Configuration error at a fully-qualified path.
    pub fn config(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn not_implemented(dialect: Database, operation: &'static str) -> Self {
        Self::NotImplemented { dialect, operation }
    }

    /// Rewrite the path of a configuration error, leaving other errors alone.
    pub(crate) fn map_config_path(self, qualify: impl FnOnce(&str) -> String) -> Self {
        match self {
            Self::InvalidConfiguration { path, message } => Self::InvalidConfiguration {
                path: qualify(&path),
                message,
            },
            Self::InvalidValue {
                path,
                expected,
                observed,
            } => Self::InvalidValue {
                path: qualify(&path),
                expected,
                observed,
            },
            other => other,
        }
    }

    pub fn strategy(strategy: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Strategy {
            strategy: strategy.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
