use crate::config::Settings;
use crate::Command;
use anyhow::Context as _;
use serde::Serialize;
use sift_postgres::PgSearchStore;
use sift_query::{
    Database, LimitMode, SchemaScript, SearchApi, SearchInput, SearchResults, StrategyRegistry,
};
use std::sync::Arc;

pub async fn run(command: Command, settings: Settings, dialect: Database) -> anyhow::Result<()> {
    let mut registry = StrategyRegistry::new();
    sift_content::register(&mut registry);
    let api = SearchApi::new(dialect, Arc::new(registry), Arc::new(settings.search.clone()));

    match command {
        Command::ListEndpoints => {
            for id in api.configuration().endpoints.keys() {
                println!("{id}");
            }
        }
        Command::PrintEndpoint { endpoint } => print_json(api.endpoint(&endpoint)?)?,
        Command::ListSchemas => {
            for id in api.configuration().schemas.keys() {
                println!("{id}");
            }
        }
        Command::PrintSchema { schema } => print_json(api.schema(&schema)?)?,
        Command::PrintSchemaCreate => print!("{}", api.schema_tool().create_schema_sql()?),
        Command::PrintSchemaDrop => print!("{}", api.schema_tool().drop_schema_sql()?),
        Command::SchemaCreate => {
            let script = api.schema_tool().create_script()?;
            apply(&settings, &script).await?;
        }
        Command::SchemaDrop => {
            let script = api.schema_tool().drop_script()?;
            apply(&settings, &script).await?;
        }
        Command::SchemaReset => {
            let tool = api.schema_tool();
            let mut script = tool.drop_script()?;
            script.extend(tool.create_script()?);
            apply(&settings, &script).await?;
        }
        Command::PrintRefresh { schema } => {
            print!("{}", api.schema_tool().refresh_dependencies_sql(schema.as_deref())?)
        }
        Command::Refresh { schema } => {
            let script = api.schema_tool().refresh_script(schema.as_deref())?;
            apply(&settings, &script).await?;
        }
        Command::PrintSearchQuery {
            endpoint,
            options,
            per_type,
        } => {
            let mode = if per_type {
                LimitMode::PerType
            } else {
                LimitMode::Global
            };
            println!("{}", api.search_query(&endpoint, options.as_ref(), mode)?.sql()?);
        }
        Command::Query {
            endpoint,
            query,
            type_limits,
            params,
            options,
            limit,
            show_meta_data,
        } => {
            let mut input = match type_limits {
                Some(limits) => SearchInput::with_type_limits(query, limits),
                None => SearchInput::with_global_limit(query, limit),
            };
            for (filter_id, values) in params.unwrap_or_default() {
                input = input.with_filter_parameters(filter_id, values);
            }

            let store = connect(&settings).await?;
            let results = store
                .search_endpoint(&api, &endpoint, options.as_ref(), &input)
                .await?;
            print_results(&results, show_meta_data)?;
        }
    }
    Ok(())
}

async fn connect(settings: &Settings) -> anyhow::Result<PgSearchStore> {
    let url = settings
        .database
        .url
        .as_deref()
        .context("database.url is not configured (set SIFT__DATABASE__URL)")?;
    PgSearchStore::connect(url, settings.database.max_connections)
        .await
        .context("failed to connect to the database")
}

async fn apply(settings: &Settings, script: &SchemaScript) -> anyhow::Result<()> {
    if script.is_empty() {
        println!("nothing to do");
        return Ok(());
    }
    let store = connect(settings).await?;
    let applied = store.execute_script(script).await?;
    println!(
        "applied {applied} statement(s) for {} schema section(s)",
        script.sections().len()
    );
    Ok(())
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_results(results: &SearchResults, show_meta_data: bool) -> anyhow::Result<()> {
    for result in results.iter() {
        println!(
            "{:.4}  {}  {}  {}  {}",
            result.score(),
            result.result_type(),
            result.identifier(),
            result.title(),
            result.url().unwrap_or("-"),
        );
        if show_meta_data {
            println!("    group: {}", serde_json::to_string(result.group_meta_data())?);
            println!("    matches: {}", serde_json::to_string(result.meta_data())?);
        }
    }
    println!(
        "{} result(s) in {:.1} ms",
        results.len(),
        results.query_execution_time_ms()
    );
    Ok(())
}
