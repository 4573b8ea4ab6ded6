//! Settings for the `sift` binary.
//!
//! Loaded once from a TOML file layered with `SIFT__*` environment variables
//! (`SIFT__DATABASE__URL`, `SIFT__LOGGING__LEVEL`, ...). The `endpoints` and
//! `schemas` tables of the same file form the search configuration.

use anyhow::Context as _;
use config::{Config, Environment, File};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sift_query::SearchConfiguration;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub dialect: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            dialect: "postgres".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub search: SearchConfiguration,
}

impl Settings {
    /// Read `path` (optional when it does not exist) and the environment.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("SIFT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let raw: JsonValue = config
            .try_deserialize()
            .context("configuration is not a table")?;

        let database = section(&raw, "database")?;
        let logging = section(&raw, "logging")?;
        let search = SearchConfiguration::from_value(&raw)?;
        Ok(Self {
            database,
            logging,
            search,
        })
    }
}

fn section<T: Default + serde::de::DeserializeOwned>(raw: &JsonValue, key: &str) -> anyhow::Result<T> {
    match raw.get(key) {
        Some(value) => serde_json::from_value(value.clone())
            .with_context(|| format!("invalid [{key}] configuration")),
        None => Ok(T::default()),
    }
}
