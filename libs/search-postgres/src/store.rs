//! Search execution against PostgreSQL.

use crate::error::{Error, Result};
use serde_json::Value as JsonValue;
use sift_query::{
    BindValue, Database, Options, PreparedSearch, SearchApi, SearchInput, SearchResult,
    SearchResultTypeName, SearchResults,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Instant;

/// Runs prepared searches and schema scripts on one connection pool.
#[derive(Debug, Clone)]
pub struct PgSearchStore {
    pool: PgPool,
}

impl PgSearchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Assemble, bind and execute the search of one endpoint.
    pub async fn search_endpoint(
        &self,
        api: &SearchApi,
        endpoint_id: &str,
        overrides: Option<&Options>,
        input: &SearchInput,
    ) -> Result<SearchResults> {
        if api.dialect() != Database::Postgres {
            return Err(sift_query::Error::UnsupportedDatabase(api.dialect().to_string()).into());
        }
        let prepared = api.prepare_search(endpoint_id, overrides, input)?;
        self.search(&prepared).await
    }

    /// Execute an already bound search.
    pub async fn search(&self, prepared: &PreparedSearch) -> Result<SearchResults> {
        let mut query = sqlx::query(prepared.sql());
        for parameter in prepared.parameters() {
            query = match &parameter.value {
                BindValue::Text(v) => query.bind(v.clone()),
                BindValue::TextArray(vs) => query.bind(vs.clone()),
                BindValue::Integer(v) => query.bind(*v),
                BindValue::Float(v) => query.bind(*v),
                BindValue::Bool(v) => query.bind(*v),
                BindValue::Json(v) => query.bind(v.clone()),
            };
        }

        let started = Instant::now();
        let rows = query.fetch_all(&self.pool).await?;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let results = rows.iter().map(result_from_row).collect::<Result<Vec<_>>>()?;
        tracing::info!(
            results = results.len(),
            parameters = prepared.parameters().len(),
            elapsed_ms,
            "Search executed"
        );
        Ok(SearchResults::new(results, elapsed_ms))
    }
}

fn result_from_row(row: &PgRow) -> Result<SearchResult> {
    let result_type: String = row.try_get("result_type")?;
    let result_type = SearchResultTypeName::new(result_type.as_str())
        .map_err(|e| Error::InvalidRow(e.to_string()))?;

    Ok(SearchResult::from_row(
        row.try_get("result_id")?,
        result_type,
        row.try_get::<Option<String>, _>("result_title")?.unwrap_or_default(),
        row.try_get("result_url")?,
        row.try_get("score")?,
        row.try_get("match_count")?,
        row.try_get::<Option<JsonValue>, _>("group_meta_data")?
            .unwrap_or(JsonValue::Null),
        row.try_get::<Option<JsonValue>, _>("meta_data")?
            .unwrap_or(JsonValue::Null),
    ))
}
