use crate::schema::ContentSchemaOptions;
use sift_query::{Database, DependencyRefresher, Error, Options, Result};

/// Re-fills the lookup table of a content schema from its `lookup` select.
#[derive(Debug, Default, Clone, Copy)]
pub struct LookupRefresher;

impl DependencyRefresher for LookupRefresher {
    fn refresh_dependencies(
        &self,
        dialect: Database,
        schema_id: &str,
        options: &Options,
    ) -> Result<Vec<String>> {
        let options = ContentSchemaOptions::from_options(schema_id, options)?;
        let Some(lookup) = &options.lookup else {
            return Ok(Vec::new());
        };
        let table = options.names.lookup_table();
        match dialect {
            Database::Postgres => Ok(vec![
                format!("TRUNCATE {table}"),
                format!("INSERT INTO {table}\n{lookup}"),
            ]),
            Database::MariaDb => Err(Error::not_implemented(dialect, "lookup refresh")),
        }
    }
}
