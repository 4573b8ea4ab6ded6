//! Database dialects and the SQL utilities that differ between them.
//!
//! Every dialect-dependent operation matches exhaustively on [`Database`].
//! Only PostgreSQL is implemented; the MariaDB arm reports
//! [`Error::NotImplemented`] instead of borrowing PostgreSQL syntax.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod placeholders;
pub mod postgres;
mod tsquery;

pub use placeholders::PositionalSql;

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Postgres,
    MariaDb,
}

impl Database {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MariaDb => "mariadb",
        }
    }

    /// Rewrite `:name` placeholders into the dialect's positional form.
    pub fn positional_placeholders(self, sql: &str) -> Result<PositionalSql> {
        match self {
            Self::Postgres => Ok(placeholders::rewrite(sql, |idx| format!("${idx}"))),
            Self::MariaDb => Err(Error::not_implemented(self, "positional placeholders")),
        }
    }

    /// Compile end-user search text into the dialect's fulltext query syntax.
    pub fn search_term(self, raw: &str) -> Result<String> {
        match self {
            Self::Postgres => Ok(tsquery::compile_search_term(raw)),
            Self::MariaDb => Err(Error::not_implemented(self, "search term normalization")),
        }
    }

    /// Weighted fulltext document expression for one bucket.
    pub fn weighted_document(self, language: &str, text_expr: &str, bucket: Bucket) -> Result<String> {
        match self {
            Self::Postgres => Ok(postgres::weighted_tsvector(language, text_expr, bucket)),
            Self::MariaDb => Err(Error::not_implemented(self, "weighted fulltext documents")),
        }
    }

    /// Boolean expression matching a fulltext column against a bound query parameter.
    pub fn fulltext_match(self, column: &str, language: &str, query_param: &str) -> Result<String> {
        match self {
            Self::Postgres => Ok(format!(
                "{column} @@ {}",
                postgres::tsquery(language, query_param)
            )),
            Self::MariaDb => Err(Error::not_implemented(self, "fulltext matching")),
        }
    }

    /// Relevance expression for a fulltext column, weighted per bucket.
    pub fn fulltext_rank(
        self,
        column: &str,
        language: &str,
        query_param: &str,
        weights: &BucketWeights,
    ) -> Result<String> {
        match self {
            Self::Postgres => Ok(postgres::weighted_rank(column, language, query_param, weights)),
            Self::MariaDb => Err(Error::not_implemented(self, "fulltext ranking")),
        }
    }

    /// `CREATE` statement for the HTML tag extraction function.
    pub fn create_extract_html_function(self, name: &str) -> Result<String> {
        match self {
            Self::Postgres => Ok(postgres::create_extract_html_function(name)),
            Self::MariaDb => Err(Error::not_implemented(self, "HTML extraction")),
        }
    }

    /// `CREATE` statement for the HTML stripping function.
    pub fn create_strip_html_function(self, name: &str) -> Result<String> {
        match self {
            Self::Postgres => Ok(postgres::create_strip_html_function(name)),
            Self::MariaDb => Err(Error::not_implemented(self, "HTML stripping")),
        }
    }

    pub fn drop_extract_html_function(self, name: &str) -> Result<String> {
        match self {
            Self::Postgres => Ok(format!("DROP FUNCTION IF EXISTS {name}(text, text)")),
            Self::MariaDb => Err(Error::not_implemented(self, "HTML extraction")),
        }
    }

    pub fn drop_strip_html_function(self, name: &str) -> Result<String> {
        match self {
            Self::Postgres => Ok(format!("DROP FUNCTION IF EXISTS {name}(text)")),
            Self::MariaDb => Err(Error::not_implemented(self, "HTML stripping")),
        }
    }

    /// Text of all tags belonging to `bucket`, extracted from an HTML expression.
    pub fn extract_html(self, function: &str, html_expr: &str, bucket: Bucket) -> Result<Option<String>> {
        match self {
            Self::Postgres => Ok(postgres::html_heading_pattern(bucket)
                .map(|pattern| format!("{function}({html_expr}, '{pattern}')"))),
            Self::MariaDb => Err(Error::not_implemented(self, "HTML extraction")),
        }
    }

    pub fn strip_html(self, function: &str, html_expr: &str) -> Result<String> {
        match self {
            Self::Postgres => Ok(format!("{function}({html_expr})")),
            Self::MariaDb => Err(Error::not_implemented(self, "HTML stripping")),
        }
    }

    /// Default score aggregation over all filter rows of one result.
    pub fn default_score_aggregation(self) -> Result<&'static str> {
        match self {
            Self::Postgres => Ok("max(score)"),
            Self::MariaDb => Err(Error::not_implemented(self, "score aggregation")),
        }
    }

    /// Default group metadata: the metadata of the best scoring row.
    pub fn default_group_meta_data(self) -> Result<&'static str> {
        match self {
            Self::Postgres => Ok("(jsonb_agg(meta_data ORDER BY score DESC) -> 0)"),
            Self::MariaDb => Err(Error::not_implemented(self, "group metadata aggregation")),
        }
    }

    /// Aggregate a per-row JSON expression into a JSON array.
    pub fn json_array_agg(self, expr: &str) -> Result<String> {
        match self {
            Self::Postgres => Ok(format!("jsonb_agg({expr})")),
            Self::MariaDb => Err(Error::not_implemented(self, "JSON aggregation")),
        }
    }

    /// Build a JSON object from `(key, expression)` pairs.
    pub fn json_object(self, entries: &[(String, String)]) -> Result<String> {
        match self {
            Self::Postgres => {
                if entries.is_empty() {
                    return Ok("'{}'::jsonb".to_string());
                }
                let args = entries
                    .iter()
                    .map(|(key, expr)| format!("{}, {expr}", string_literal(key)))
                    .collect::<Vec<_>>()
                    .join(", ");
                Ok(format!("jsonb_build_object({args})"))
            }
            Self::MariaDb => Err(Error::not_implemented(self, "JSON objects")),
        }
    }

    /// `LIMIT` clause bound to a named parameter.
    pub fn limit_clause(self, param: &str) -> Result<String> {
        match self {
            Self::Postgres => Ok(format!("LIMIT :{param}")),
            Self::MariaDb => Err(Error::not_implemented(self, "limit clauses")),
        }
    }

    /// Cast a bound placeholder to a SQL type so `NULL` keeps its type.
    pub fn typed_placeholder(self, param: &str, sql_type: SqlType) -> Result<String> {
        match self {
            Self::Postgres => Ok(format!(":{param}::{}", postgres::type_name(sql_type))),
            Self::MariaDb => Err(Error::not_implemented(self, "typed placeholders")),
        }
    }

    /// Cast an arbitrary expression to a SQL type.
    pub fn cast(self, expr: &str, sql_type: SqlType) -> Result<String> {
        match self {
            Self::Postgres => Ok(format!("{expr}::{}", postgres::type_name(sql_type))),
            Self::MariaDb => Err(Error::not_implemented(self, "casts")),
        }
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Database {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mariadb" | "mysql" => Ok(Self::MariaDb),
            other => Err(Error::UnsupportedDatabase(other.to_string())),
        }
    }
}

/// Column types the composition layer needs to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    TextArray,
    BigInt,
    Float,
    Boolean,
    Json,
}

/// Weighted fulltext zone used to bias relevance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Critical,
    Major,
    Normal,
    Minor,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [Self::Critical, Self::Major, Self::Normal, Self::Minor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Major => "major",
            Self::Normal => "normal",
            Self::Minor => "minor",
        }
    }
}

impl FromStr for Bucket {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Self::Critical),
            "major" => Ok(Self::Major),
            "normal" => Ok(Self::Normal),
            "minor" => Ok(Self::Minor),
            _ => Err(()),
        }
    }
}

/// Relative weight per bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketWeights {
    pub critical: f64,
    pub major: f64,
    pub normal: f64,
    pub minor: f64,
}

impl Default for BucketWeights {
    fn default() -> Self {
        Self {
            critical: 1.0,
            major: 0.5,
            normal: 0.2,
            minor: 0.1,
        }
    }
}

impl BucketWeights {
    pub fn get(&self, bucket: Bucket) -> f64 {
        match bucket {
            Bucket::Critical => self.critical,
            Bucket::Major => self.major,
            Bucket::Normal => self.normal,
            Bucket::Minor => self.minor,
        }
    }

    /// Scale weights into `[0, 1]`, keeping their ratios.
    pub fn normalized(&self) -> Self {
        let max = Bucket::ALL
            .iter()
            .map(|b| self.get(*b))
            .fold(0.0_f64, f64::max);
        if max <= 1.0 {
            return *self;
        }
        Self {
            critical: self.critical / max,
            major: self.major / max,
            normal: self.normal / max,
            minor: self.minor / max,
        }
    }
}

/// Quote a string as a SQL literal. Only used for configuration values.
pub fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
