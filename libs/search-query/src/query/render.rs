use super::{LimitMode, SearchQuery};
use crate::error::{Error, Result};
use crate::params::GLOBAL_LIMIT_PARAMETER;

/// CTE holding the union of all type aggregator subqueries.
pub const ALL_RESULTS_CTE: &str = "all_results";

const RESULT_COLUMNS: &str =
    "result_id, result_type, result_title, result_url, score, match_count, group_meta_data, meta_data";

pub(super) fn render(query: &SearchQuery) -> Result<String> {
    if query.source_fragments.is_empty() {
        return Err(Error::NoSourceFragments(query.endpoint_id.clone()));
    }
    if query.merging_fragments.is_empty() {
        return Err(Error::NoResultTypes(query.endpoint_id.clone()));
    }

    let mut ctes: Vec<String> = query
        .source_fragments
        .iter()
        .map(|(name, body)| format!("{name} AS (\n{}\n)", indent(body.trim())))
        .collect();

    let merged = query
        .merging_fragments
        .iter()
        .map(|fragment| format!("(\n{}\n)", indent(fragment.trim())))
        .collect::<Vec<_>>()
        .join("\nUNION\n");
    ctes.push(format!("{ALL_RESULTS_CTE} AS (\n{}\n)", indent(&merged)));

    let mut sql = format!(
        "WITH {}\nSELECT {RESULT_COLUMNS}\nFROM {ALL_RESULTS_CTE}\nORDER BY score DESC",
        ctes.join(",\n")
    );
    if query.limit_mode == LimitMode::Global {
        sql.push('\n');
        sql.push_str(&query.dialect.limit_clause(GLOBAL_LIMIT_PARAMETER)?);
    }
    Ok(sql)
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("    {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
