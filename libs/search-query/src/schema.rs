//! Schema lifecycle scripts: create, drop and dependency refresh.
//!
//! DDL is regenerated on every call. Scripts are sequences of independent
//! statements; databases used here cannot roll DDL back, so callers executing
//! a script must report how far it got.

use crate::config::SchemaConfiguration;
use crate::dialect::Database;
use crate::error::{Error, Result};
use crate::registry::StrategyRegistry;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVerb {
    Create,
    Drop,
    Refresh,
}

impl SchemaVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Drop => "DROP",
            Self::Refresh => "REFRESH",
        }
    }
}

impl fmt::Display for SchemaVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statements produced for one schema id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaSection {
    pub schema_id: String,
    pub verb: SchemaVerb,
    pub statements: Vec<String>,
}

/// Ordered sections, one per schema id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaScript {
    sections: Vec<SchemaSection>,
}

impl SchemaScript {
    pub fn sections(&self) -> &[SchemaSection] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.statements.is_empty())
    }

    pub fn statement_count(&self) -> usize {
        self.sections.iter().map(|s| s.statements.len()).sum()
    }

    /// Append another script, e.g. drop followed by create for a reset.
    pub fn extend(&mut self, other: SchemaScript) {
        self.sections.extend(other.sections);
    }

    /// SQL text with `START/END OF <verb> SCHEMA '<id>'` delimiters.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str(&format!(
                "-- START OF {} SCHEMA '{}'\n",
                section.verb, section.schema_id
            ));
            for statement in &section.statements {
                out.push_str(statement.trim_end().trim_end_matches(';'));
                out.push_str(";\n");
            }
            out.push_str(&format!(
                "-- END OF {} SCHEMA '{}'\n\n",
                section.verb, section.schema_id
            ));
        }
        out
    }
}

impl fmt::Display for SchemaScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Builds schema scripts from the configured schema strategies.
pub struct SchemaTool<'a> {
    dialect: Database,
    registry: &'a StrategyRegistry,
    schemas: &'a IndexMap<String, SchemaConfiguration>,
}

impl<'a> SchemaTool<'a> {
    pub fn new(
        dialect: Database,
        registry: &'a StrategyRegistry,
        schemas: &'a IndexMap<String, SchemaConfiguration>,
    ) -> Self {
        Self {
            dialect,
            registry,
            schemas,
        }
    }

    /// CREATE statements for every schema, in declaration order.
    pub fn create_script(&self) -> Result<SchemaScript> {
        let mut script = SchemaScript::default();
        for schema in self.schemas.values() {
            let strategy = self.registry.schema(&schema.schema)?;
            script.sections.push(SchemaSection {
                schema_id: schema.schema_id.clone(),
                verb: SchemaVerb::Create,
                statements: strategy.create_schema(self.dialect, &schema.schema_id, &schema.options)?,
            });
        }
        Ok(script)
    }

    /// DROP statements for every schema, in declaration order.
    pub fn drop_script(&self) -> Result<SchemaScript> {
        let mut script = SchemaScript::default();
        for schema in self.schemas.values() {
            let strategy = self.registry.schema(&schema.schema)?;
            script.sections.push(SchemaSection {
                schema_id: schema.schema_id.clone(),
                verb: SchemaVerb::Drop,
                statements: strategy.drop_schema(self.dialect, &schema.schema_id, &schema.options)?,
            });
        }
        Ok(script)
    }

    /// Refresh statements for one schema, or for all schemas with a refresher.
    pub fn refresh_script(&self, schema_filter: Option<&str>) -> Result<SchemaScript> {
        let selected: Vec<&SchemaConfiguration> = match schema_filter {
            Some(id) => vec![self
                .schemas
                .get(id)
                .ok_or_else(|| Error::SchemaFilterMismatch(id.to_string()))?],
            None => self.schemas.values().collect(),
        };

        let mut script = SchemaScript::default();
        for schema in selected {
            let Some(reference) = schema.refresher.as_deref() else {
                tracing::debug!(schema_id = %schema.schema_id, "Schema has no dependency refresher");
                continue;
            };
            let refresher = self.registry.refresher(reference)?;
            script.sections.push(SchemaSection {
                schema_id: schema.schema_id.clone(),
                verb: SchemaVerb::Refresh,
                statements: refresher.refresh_dependencies(
                    self.dialect,
                    &schema.schema_id,
                    &schema.options,
                )?,
            });
        }
        Ok(script)
    }

    pub fn create_schema_sql(&self) -> Result<String> {
        Ok(self.create_script()?.render())
    }

    pub fn drop_schema_sql(&self) -> Result<String> {
        Ok(self.drop_script()?.render())
    }

    pub fn refresh_dependencies_sql(&self, schema_filter: Option<&str>) -> Result<String> {
        Ok(self.refresh_script(schema_filter)?.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_delimited_sections() {
        let script = SchemaScript {
            sections: vec![SchemaSection {
                schema_id: "pages".into(),
                verb: SchemaVerb::Create,
                statements: vec!["CREATE TABLE a (x int);".into(), "CREATE INDEX b ON a (x)".into()],
            }],
        };
        assert_eq!(
            script.render(),
            "-- START OF CREATE SCHEMA 'pages'\nCREATE TABLE a (x int);\nCREATE INDEX b ON a (x);\n-- END OF CREATE SCHEMA 'pages'\n\n"
        );
        assert_eq!(script.statement_count(), 2);
    }
}
