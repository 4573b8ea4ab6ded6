//! Schema script execution.
//!
//! Statements run one by one on the pool, outside any transaction. A failure
//! stops the script and reports how many statements were already applied;
//! nothing is rolled back or retried.

use crate::error::{Error, Result};
use crate::store::PgSearchStore;
use sift_query::{SchemaScript, SchemaVerb};
use std::time::{Duration, Instant};

/// Refreshes may run inside a publish request of the host system.
const REFRESH_TARGET: Duration = Duration::from_secs(1);

impl PgSearchStore {
    /// Execute every statement of `script` in order. Returns the number applied.
    pub async fn execute_script(&self, script: &SchemaScript) -> Result<usize> {
        let mut applied = 0usize;

        for section in script.sections() {
            let started = Instant::now();
            for (statement_index, statement) in section.statements.iter().enumerate() {
                tracing::debug!(
                    schema_id = %section.schema_id,
                    verb = %section.verb,
                    statement_index,
                    "Executing schema statement"
                );
                sqlx::raw_sql(statement)
                    .execute(self.pool())
                    .await
                    .map_err(|source| Error::ScriptAborted {
                        schema_id: section.schema_id.clone(),
                        verb: section.verb,
                        statement_index,
                        applied,
                        source,
                    })?;
                applied += 1;
            }

            let elapsed = started.elapsed();
            tracing::info!(
                schema_id = %section.schema_id,
                verb = %section.verb,
                statements = section.statements.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Schema section applied"
            );
            if section.verb == SchemaVerb::Refresh && elapsed > REFRESH_TARGET {
                tracing::warn!(
                    schema_id = %section.schema_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Dependency refresh exceeded one second"
                );
            }
        }

        Ok(applied)
    }
}
