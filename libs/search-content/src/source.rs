//! Fulltext source over a content table.

use crate::naming::{default_prefix, SchemaNames};
use serde_json::json;
use sha2::{Digest, Sha256};
use sift_query::params::QUERY_PARAMETER;
use sift_query::{
    merge_options, BucketWeights, Database, Error, Options, OptionsExt, Result, SearchSource,
};

/// Effective options of one source for one filter.
///
/// Read from `sources.<sourceId>` in the query options, overridden by the
/// same key in the filter options.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub source_id: String,
    pub table: String,
    pub id_column: String,
    pub language: String,
    pub weights: BucketWeights,
    pub names: SchemaNames,
}

fn source_options<'a>(options: &'a Options, path: &str, source_id: &str) -> Result<Option<&'a Options>> {
    match options.opt_object(path, "sources")? {
        Some(sources) => sources.opt_object(&format!("{path}.sources"), source_id),
        None => Ok(None),
    }
}

impl SourceSettings {
    pub fn resolve(source_id: &str, query_options: &Options, filter_options: &Options) -> Result<Self> {
        let base = source_options(query_options, "query_options", source_id)?;
        let patch = source_options(filter_options, "options", source_id)?;
        let effective = match (base, patch) {
            (Some(base), Some(patch)) => merge_options(base, patch),
            (Some(only), None) | (None, Some(only)) => only.clone(),
            (None, None) => Options::new(),
        };
        let path = format!("sources.{source_id}");

        let table = effective
            .opt_table(&path, "table")?
            .ok_or_else(|| Error::config(format!("{path}.table"), "missing required value"))?
            .to_string();
        let schema_id = effective.opt_str(&path, "schema")?.unwrap_or(source_id);
        let prefix = match effective.opt_identifier(&path, "prefix")? {
            Some(prefix) => prefix.to_string(),
            None => default_prefix(schema_id),
        };

        let mut weights = BucketWeights::default();
        if let Some(configured) = effective.opt_object(&path, "bucket_weights")? {
            let weights_path = format!("{path}.bucket_weights");
            for (key, slot) in [
                ("critical", &mut weights.critical),
                ("major", &mut weights.major),
                ("normal", &mut weights.normal),
                ("minor", &mut weights.minor),
            ] {
                if let Some(value) = configured.opt_f64(&weights_path, key)? {
                    if value < 0.0 {
                        return Err(Error::config(
                            format!("{weights_path}.{key}"),
                            "bucket weights must not be negative",
                        ));
                    }
                    *slot = value;
                }
            }
        }

        Ok(Self {
            source_id: source_id.to_string(),
            names: SchemaNames::new(&table, &prefix),
            table,
            id_column: effective.opt_identifier(&path, "id_column")?.unwrap_or("id").to_string(),
            language: effective.opt_table(&path, "language")?.unwrap_or("simple").to_string(),
            weights: weights.normalized(),
        })
    }

    /// `src_<sourceId>_<8 hex digits of the effective options' SHA-256>`.
    pub fn cte_name(&self) -> String {
        let canonical = json!({
            "table": self.table,
            "prefix": self.names.prefix(),
            "id_column": self.id_column,
            "language": self.language,
            "weights": [
                self.weights.critical,
                self.weights.major,
                self.weights.normal,
                self.weights.minor
            ]
        });
        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string().as_bytes());
        let digest = hex::encode(hasher.finalize());
        let id: String = self
            .source_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        format!("src_{id}_{}", &digest[..8])
    }
}

/// The `content` source strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentSource;

impl SearchSource for ContentSource {
    fn cte_name(
        &self,
        _dialect: Database,
        source_id: &str,
        query_options: &Options,
        filter_options: &Options,
    ) -> Result<String> {
        Ok(SourceSettings::resolve(source_id, query_options, filter_options)?.cte_name())
    }

    fn searching_query_part(
        &self,
        dialect: Database,
        source_id: &str,
        query_options: &Options,
        filter_options: &Options,
    ) -> Result<String> {
        let settings = SourceSettings::resolve(source_id, query_options, filter_options)?;
        let column = format!("t.{}", settings.names.fulltext_column());
        let rank = dialect.fulltext_rank(&column, &settings.language, QUERY_PARAMETER, &settings.weights)?;
        let matches = dialect.fulltext_match(&column, &settings.language, QUERY_PARAMETER)?;
        Ok(format!(
            "SELECT t.{}::text AS content_id,\n    {rank} AS score\nFROM {} t\nWHERE {matches}",
            settings.id_column, settings.table
        ))
    }
}
