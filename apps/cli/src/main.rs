//! `sift`: inspect search endpoints, manage search schemas and run queries.

mod commands;
mod config;
mod logging;

use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sift_query::{Database, Options, SearchResultTypeName};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sift", version, about = "Multi-source fulltext search over SQL")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "SIFT_CONFIG", default_value = "sift.toml")]
    config: PathBuf,

    /// Database dialect, overrides `database.dialect`
    #[arg(long, global = true)]
    database: Option<Database>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List configured endpoint ids
    ListEndpoints,
    /// Print one endpoint configuration as JSON
    PrintEndpoint { endpoint: String },
    /// List configured schema ids
    ListSchemas,
    /// Print one schema configuration as JSON
    PrintSchema { schema: String },
    /// Print the DDL creating all schemas
    PrintSchemaCreate,
    /// Print the DDL dropping all schemas
    PrintSchemaDrop,
    /// Create all schemas
    SchemaCreate,
    /// Drop all schemas
    SchemaDrop,
    /// Drop, then create all schemas
    SchemaReset,
    /// Print the statements refreshing derived search data
    PrintRefresh {
        #[arg(long)]
        schema: Option<String>,
    },
    /// Refresh derived search data
    Refresh {
        #[arg(long)]
        schema: Option<String>,
    },
    /// Print the assembled search SQL of an endpoint
    PrintSearchQuery {
        endpoint: String,
        /// Query option overrides (JSON object)
        #[arg(long, value_parser = parse_json_object)]
        options: Option<Options>,
        /// Render with one LIMIT per result type instead of a global one
        #[arg(long)]
        per_type: bool,
    },
    /// Run a search
    Query {
        endpoint: String,
        query: String,
        /// Per result type limits, e.g. '{"page": 10, "asset": 5}'
        #[arg(long, value_parser = parse_type_limits)]
        type_limits: Option<IndexMap<SearchResultTypeName, i64>>,
        /// Filter parameters, e.g. '{"pages": {"site": "main"}}'
        #[arg(long, value_parser = parse_filter_parameters)]
        params: Option<IndexMap<String, Options>>,
        /// Query option overrides (JSON object)
        #[arg(long, value_parser = parse_json_object)]
        options: Option<Options>,
        /// Global result limit
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(i64).range(0..))]
        limit: i64,
        /// Print group and match metadata
        #[arg(long)]
        show_meta_data: bool,
    },
}

fn parse_json_object(raw: &str) -> Result<Options, String> {
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, found {}", sift_query::params::describe(&other))),
        Err(e) => Err(format!("malformed JSON: {e}")),
    }
}

fn parse_type_limits(raw: &str) -> Result<IndexMap<SearchResultTypeName, i64>, String> {
    let mut limits = IndexMap::new();
    for (name, value) in parse_json_object(raw)? {
        let result_type = SearchResultTypeName::new(name.as_str()).map_err(|e| e.to_string())?;
        let limit = value
            .as_i64()
            .filter(|limit| *limit >= 0)
            .ok_or_else(|| format!("limit of '{name}' must be a non-negative integer"))?;
        limits.insert(result_type, limit);
    }
    Ok(limits)
}

fn parse_filter_parameters(raw: &str) -> Result<IndexMap<String, Options>, String> {
    let mut parameters = IndexMap::new();
    for (filter_id, value) in parse_json_object(raw)? {
        match value {
            JsonValue::Object(values) => {
                parameters.insert(filter_id, values);
            }
            other => {
                return Err(format!(
                    "parameters of filter '{filter_id}' must be a JSON object, found {}",
                    sift_query::params::describe(&other)
                ));
            }
        }
    }
    Ok(parameters)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = config::Settings::load(&cli.config)?;
    logging::init_logging(&settings.logging)?;

    let dialect = match cli.database {
        Some(dialect) => dialect,
        None => settings.database.dialect.parse()?,
    };
    commands::run(cli.command, settings, dialect).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rejects_malformed_json_flags() {
        let err = Cli::try_parse_from(["sift", "print-search-query", "site", "--options", "{nope"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(err.to_string().contains("malformed JSON"));

        let err = Cli::try_parse_from(["sift", "query", "site", "rust", "--params", "[1]"]).unwrap_err();
        assert!(err.to_string().contains("expected a JSON object, found array"));
    }

    #[test]
    fn parses_query_flags() {
        let cli = Cli::try_parse_from([
            "sift",
            "--database",
            "postgres",
            "query",
            "site",
            "rust",
            "--type-limits",
            r#"{"page": 5}"#,
            "--params",
            r#"{"pages": {"site": "main"}}"#,
        ])
        .unwrap();
        assert_eq!(cli.database, Some(Database::Postgres));
        let Command::Query {
            type_limits, params, ..
        } = cli.command
        else {
            panic!("expected query command");
        };
        let type_limits = type_limits.unwrap();
        assert_eq!(type_limits.get(&SearchResultTypeName::new("page").unwrap()), Some(&5));
        assert_eq!(params.unwrap()["pages"]["site"], "main");
    }

    #[test]
    fn rejects_negative_global_limit() {
        let err = Cli::try_parse_from(["sift", "query", "site", "rust", "--limit=-1"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let cli = Cli::try_parse_from(["sift", "query", "site", "rust", "--limit", "0"]).unwrap();
        assert!(matches!(cli.command, Command::Query { limit: 0, .. }));
    }

    #[test]
    fn rejects_negative_type_limits() {
        assert!(parse_type_limits(r#"{"page": -1}"#).is_err());
        assert!(parse_type_limits(r#"{"bad-name": 1}"#).is_err());
    }
}
