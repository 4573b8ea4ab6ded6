//! The built-in type aggregator.

use crate::config::{Options, OptionsExt};
use crate::dialect::{Database, SqlType};
use crate::error::{Error, Result};
use crate::model::SearchResultTypeName;
use crate::sql::TrustedSql;
use crate::strategy::TypeAggregator;

/// Unions all filter rows of a type and groups them by `result_id`.
///
/// Options:
/// - `score_aggregation`: SQL over the grouped rows, default `max(score)`
/// - `group_meta_data`: SQL producing one JSON object per group, default the
///   metadata of the best scoring row
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTypeAggregator;

impl TypeAggregator for DefaultTypeAggregator {
    fn aggregator_query_part(
        &self,
        dialect: Database,
        result_type: &SearchResultTypeName,
        filter_fragments: &[String],
        _query_options: &Options,
        aggregator_options: &Options,
        limit_parameter: Option<&str>,
    ) -> Result<String> {
        if filter_fragments.is_empty() {
            return Err(Error::strategy(
                "default type aggregator",
                format!("no filter fragments for result type {result_type}"),
            ));
        }
        let path = format!("type_aggregators.{result_type}.options");

        let score = match aggregator_options.trusted_sql(&path, "score_aggregation")? {
            Some(sql) => sql,
            None => TrustedSql::from_static(dialect.default_score_aggregation()?),
        };
        let group_meta_data = match aggregator_options.trusted_sql(&path, "group_meta_data")? {
            Some(sql) => sql,
            None => TrustedSql::from_static(dialect.default_group_meta_data()?),
        };

        let score = dialect.cast(&format!("({score})"), SqlType::Float)?;
        let meta_data = dialect.json_array_agg("meta_data")?;
        let matches = filter_fragments
            .iter()
            .map(|fragment| format!("    (\n{}\n    )", indent(fragment.trim(), 8)))
            .collect::<Vec<_>>()
            .join("\n    UNION ALL\n");

        let mut sql = format!(
            "SELECT result_id, result_type,\n\
             \x20   max(result_title) AS result_title,\n\
             \x20   max(result_url) AS result_url,\n\
             \x20   {score} AS score,\n\
             \x20   count(*) AS match_count,\n\
             \x20   {group_meta_data} AS group_meta_data,\n\
             \x20   {meta_data} AS meta_data\n\
             FROM (\n{matches}\n) AS matches_{result_type}\n\
             GROUP BY result_id, result_type"
        );
        if let Some(limit_parameter) = limit_parameter {
            sql.push_str("\nORDER BY score DESC\n");
            sql.push_str(&dialect.limit_clause(limit_parameter)?);
        }
        Ok(sql)
    }
}

fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| format!("{pad}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> SearchResultTypeName {
        SearchResultTypeName::new("page").unwrap()
    }

    #[test]
    fn unions_fragments_and_groups_by_result_id() {
        let sql = DefaultTypeAggregator
            .aggregator_query_part(
                Database::Postgres,
                &page(),
                &["SELECT a".to_string(), "SELECT b".to_string()],
                &Options::new(),
                &Options::new(),
                None,
            )
            .unwrap();
        assert!(sql.contains("(max(score))::float8 AS score"));
        assert!(sql.contains("count(*) AS match_count"));
        assert!(sql.contains("jsonb_agg(meta_data) AS meta_data"));
        assert!(sql.contains("        SELECT a\n    )\n    UNION ALL\n    (\n        SELECT b"));
        assert!(sql.ends_with("GROUP BY result_id, result_type"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn per_type_limit_binds_type_parameter() {
        let sql = DefaultTypeAggregator
            .aggregator_query_part(
                Database::Postgres,
                &page(),
                &["SELECT a".to_string()],
                &Options::new(),
                &Options::new(),
                Some("limit_page"),
            )
            .unwrap();
        assert!(sql.ends_with("ORDER BY score DESC\nLIMIT :limit_page"));
        assert_eq!(sql.matches("LIMIT").count(), 1);
    }

    #[test]
    fn uses_configured_expressions() {
        let options = json!({
            "score_aggregation": "sum(score) * 2",
            "group_meta_data": "jsonb_build_object('hits', count(*))"
        });
        let sql = DefaultTypeAggregator
            .aggregator_query_part(
                Database::Postgres,
                &page(),
                &["SELECT a".to_string()],
                &Options::new(),
                options.as_object().unwrap(),
                None,
            )
            .unwrap();
        assert!(sql.contains("(sum(score) * 2)::float8 AS score"));
        assert!(sql.contains("jsonb_build_object('hits', count(*)) AS group_meta_data"));
    }

    #[test]
    fn rejects_statement_separators_in_options() {
        let options = json!({"score_aggregation": "max(score); DROP TABLE pages"});
        let err = DefaultTypeAggregator
            .aggregator_query_part(
                Database::Postgres,
                &page(),
                &["SELECT a".to_string()],
                &Options::new(),
                options.as_object().unwrap(),
                None,
            )
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("type_aggregators.page.options.score_aggregation"));
    }
}
