//! Content schema: generated fulltext column, HTML helpers, lookup table.

use crate::naming::{default_prefix, SchemaNames};
use serde_json::Value as JsonValue;
use sift_query::sql::{identifier, qualified_identifier};
use sift_query::{
    Bucket, Database, Error, Options, OptionsExt, Result, SchemaStrategy, TrustedSql,
};

/// One indexed column of the content table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub bucket: Bucket,
    /// Headings go to the critical/major buckets, the stripped rest to `bucket`.
    pub html: bool,
}

/// Validated options of a `content` schema.
#[derive(Debug, Clone)]
pub struct ContentSchemaOptions {
    pub table: String,
    pub id_column: String,
    pub language: String,
    pub columns: Vec<ColumnSpec>,
    pub lookup: Option<TrustedSql>,
    pub names: SchemaNames,
}

impl ContentSchemaOptions {
    pub fn from_options(schema_id: &str, options: &Options) -> Result<Self> {
        let path = format!("schemas.{schema_id}.options");

        let table = qualified_identifier(options.require_str(&path, "table")?)
            .map_err(|e| Error::config(format!("{path}.table"), e.to_string()))?
            .to_string();
        let id_column = options.opt_identifier(&path, "id_column")?.unwrap_or("id").to_string();
        let language = options.opt_table(&path, "language")?.unwrap_or("simple").to_string();
        let prefix = match options.opt_identifier(&path, "prefix")? {
            Some(prefix) => prefix.to_string(),
            None => default_prefix(schema_id),
        };

        let columns = match options.opt_object(&path, "columns")? {
            Some(columns) => columns
                .iter()
                .map(|(name, spec)| column_spec(&format!("{path}.columns.{name}"), name, spec))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        if columns.is_empty() {
            return Err(Error::config(
                format!("{path}.columns"),
                "at least one column must be indexed",
            ));
        }

        Ok(Self {
            names: SchemaNames::new(&table, &prefix),
            table,
            id_column,
            language,
            columns,
            lookup: options.trusted_sql(&path, "lookup")?,
        })
    }
}

fn column_spec(path: &str, name: &str, spec: &JsonValue) -> Result<ColumnSpec> {
    identifier(name).map_err(|e| Error::config(path, e.to_string()))?;
    let (bucket, html) = match spec {
        JsonValue::String(bucket) => (bucket.as_str(), false),
        JsonValue::Object(map) => (
            map.opt_str(path, "bucket")?.unwrap_or("normal"),
            map.opt_bool(path, "html")?.unwrap_or(false),
        ),
        other => {
            return Err(Error::InvalidValue {
                path: path.to_string(),
                expected: "bucket name or object",
                observed: sift_query::params::describe(other),
            })
        }
    };
    let bucket = bucket.parse::<Bucket>().map_err(|_| {
        Error::config(
            path,
            format!("unknown bucket '{bucket}' (expected critical, major, normal or minor)"),
        )
    })?;
    Ok(ColumnSpec {
        name: name.to_string(),
        bucket,
        html,
    })
}

/// Fulltext document expression combining every bucket.
fn document_expression(dialect: Database, options: &ContentSchemaOptions) -> Result<String> {
    let names = &options.names;
    let extract = names.extract_html_function();
    let strip = names.strip_html_function();

    let mut per_bucket: Vec<(Bucket, Vec<String>)> =
        Bucket::ALL.iter().map(|b| (*b, Vec::new())).collect();
    let mut push = |bucket: Bucket, expr: String| {
        if let Some((_, exprs)) = per_bucket.iter_mut().find(|(b, _)| *b == bucket) {
            exprs.push(expr);
        }
    };

    for column in &options.columns {
        let text = format!("coalesce({}::text, '')", column.name);
        if column.html {
            for heading in [Bucket::Critical, Bucket::Major] {
                if let Some(expr) = dialect.extract_html(&extract, &text, heading)? {
                    push(heading, expr);
                }
            }
            push(column.bucket, dialect.strip_html(&strip, &text)?);
        } else {
            push(column.bucket, text);
        }
    }

    let documents = per_bucket
        .into_iter()
        .filter(|(_, exprs)| !exprs.is_empty())
        .map(|(bucket, exprs)| {
            dialect.weighted_document(&options.language, &exprs.join(" || ' ' || "), bucket)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(documents.join("\n        || "))
}

/// The `content` schema strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentSchema;

impl SchemaStrategy for ContentSchema {
    fn create_schema(&self, dialect: Database, schema_id: &str, options: &Options) -> Result<Vec<String>> {
        let options = ContentSchemaOptions::from_options(schema_id, options)?;
        let names = &options.names;

        let mut statements = match dialect {
            Database::Postgres => vec![
                dialect.create_extract_html_function(&names.extract_html_function())?,
                dialect.create_strip_html_function(&names.strip_html_function())?,
                format!(
                    "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} tsvector\n    GENERATED ALWAYS AS (\n        {}\n    ) STORED",
                    options.table,
                    names.fulltext_column(),
                    document_expression(dialect, &options)?
                ),
                format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {} USING GIN ({})",
                    names.fulltext_index(),
                    options.table,
                    names.fulltext_column()
                ),
            ],
            Database::MariaDb => return Err(Error::not_implemented(dialect, "content schema")),
        };

        if let Some(lookup) = &options.lookup {
            statements.push(format!(
                "CREATE TABLE IF NOT EXISTS {} AS\n{lookup}\nWITH NO DATA",
                names.lookup_table()
            ));
            statements.push(format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} (content_id)",
                names.lookup_index(),
                names.lookup_table()
            ));
        }

        tracing::debug!(schema_id, statements = statements.len(), "Generated content schema");
        Ok(statements)
    }

    fn drop_schema(&self, dialect: Database, schema_id: &str, options: &Options) -> Result<Vec<String>> {
        let options = ContentSchemaOptions::from_options(schema_id, options)?;
        let names = &options.names;

        match dialect {
            // Lookup objects are dropped even without a `lookup` option so a
            // removed lookup does not leave its table behind.
            Database::Postgres => Ok(vec![
                format!("DROP INDEX IF EXISTS {}", names.qualified_lookup_index()),
                format!("DROP TABLE IF EXISTS {}", names.lookup_table()),
                format!("DROP INDEX IF EXISTS {}", names.qualified_fulltext_index()),
                format!(
                    "ALTER TABLE {} DROP COLUMN IF EXISTS {}",
                    options.table,
                    names.fulltext_column()
                ),
                dialect.drop_strip_html_function(&names.strip_html_function())?,
                dialect.drop_extract_html_function(&names.extract_html_function())?,
            ]),
            Database::MariaDb => Err(Error::not_implemented(dialect, "content schema")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> Options {
        json!({
            "table": "pages",
            "columns": {
                "title": {"bucket": "critical"},
                "body": {"bucket": "normal", "html": true},
                "keywords": "minor"
            },
            "lookup": "SELECT id::text AS content_id, title FROM pages WHERE published"
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn parses_columns_and_defaults() {
        let parsed = ContentSchemaOptions::from_options("pages", &options()).unwrap();
        assert_eq!(parsed.id_column, "id");
        assert_eq!(parsed.language, "simple");
        assert_eq!(parsed.names.prefix(), "sift_pages");
        assert_eq!(parsed.columns.len(), 3);
        assert!(parsed.columns[1].html);
        assert_eq!(parsed.columns[2].bucket, Bucket::Minor);
    }

    #[test]
    fn rejects_bad_options() {
        let mut bad = options();
        bad.insert("columns".into(), json!({"title": {"bucket": "huge"}}));
        let err = ContentSchemaOptions::from_options("pages", &bad).unwrap_err();
        assert!(err.to_string().contains("schemas.pages.options.columns.title"));

        let mut bad = options();
        bad.insert("table".into(), json!("pages; DROP TABLE x"));
        assert!(ContentSchemaOptions::from_options("pages", &bad).is_err());

        let mut bad = options();
        bad.remove("table");
        assert!(ContentSchemaOptions::from_options("pages", &bad).is_err());
    }

    #[test]
    fn create_builds_weighted_generated_column() {
        let statements = ContentSchema
            .create_schema(Database::Postgres, "pages", &options())
            .unwrap();
        assert_eq!(statements.len(), 6);
        assert!(statements[0].starts_with("CREATE OR REPLACE FUNCTION sift_pages_extract_html("));
        assert!(statements[1].starts_with("CREATE OR REPLACE FUNCTION sift_pages_strip_html("));

        let column = &statements[2];
        assert!(column.starts_with("ALTER TABLE pages ADD COLUMN IF NOT EXISTS sift_pages_fulltext tsvector"));
        assert!(column.contains(
            "setweight(to_tsvector('simple'::regconfig, coalesce(title::text, '') || ' ' || sift_pages_extract_html(coalesce(body::text, ''), '<(h1|h2)[^>]*?>(.*?)</\\1>')), 'A')"
        ));
        assert!(column.contains("sift_pages_strip_html(coalesce(body::text, ''))), 'C')"));
        assert!(column.contains("coalesce(keywords::text, '')), 'D')"));
        assert!(column.ends_with("STORED"));

        assert_eq!(
            statements[3],
            "CREATE INDEX IF NOT EXISTS sift_pages_fulltext_idx ON pages USING GIN (sift_pages_fulltext)"
        );
        assert!(statements[4].starts_with("CREATE TABLE IF NOT EXISTS sift_pages_lookup AS\nSELECT"));
        assert!(statements[4].ends_with("WITH NO DATA"));
    }

    #[test]
    fn lookup_is_optional_on_create() {
        let mut opts = options();
        opts.remove("lookup");
        let statements = ContentSchema
            .create_schema(Database::Postgres, "pages", &opts)
            .unwrap();
        assert_eq!(statements.len(), 4);
    }

    #[test]
    fn mariadb_is_not_implemented() {
        assert!(matches!(
            ContentSchema.create_schema(Database::MariaDb, "pages", &options()),
            Err(Error::NotImplemented { .. })
        ));
    }
}
