//! PostgreSQL fulltext and HTML helpers.

use super::{Bucket, BucketWeights, SqlType};

pub(crate) fn type_name(sql_type: SqlType) -> &'static str {
    match sql_type {
        SqlType::Text => "text",
        SqlType::TextArray => "text[]",
        SqlType::BigInt => "bigint",
        SqlType::Float => "float8",
        SqlType::Boolean => "boolean",
        SqlType::Json => "jsonb",
    }
}

fn weight_label(bucket: Bucket) -> char {
    match bucket {
        Bucket::Critical => 'A',
        Bucket::Major => 'B',
        Bucket::Normal => 'C',
        Bucket::Minor => 'D',
    }
}

fn regconfig(language: &str) -> String {
    format!("'{language}'::regconfig")
}

/// `to_tsquery` over a bound search term.
pub(crate) fn tsquery(language: &str, query_param: &str) -> String {
    format!("to_tsquery({}, :{query_param})", regconfig(language))
}

/// `setweight(to_tsvector(...), 'A')` for one bucket.
pub(crate) fn weighted_tsvector(language: &str, text_expr: &str, bucket: Bucket) -> String {
    format!(
        "setweight(to_tsvector({}, {text_expr}), '{}')",
        regconfig(language),
        weight_label(bucket)
    )
}

/// `ts_rank` with the weights array ordered `{D, C, B, A}`.
pub(crate) fn weighted_rank(
    column: &str,
    language: &str,
    query_param: &str,
    weights: &BucketWeights,
) -> String {
    let w = weights.normalized();
    format!(
        "ts_rank('{{{}, {}, {}, {}}}'::float4[], {column}, {})",
        format_weight(w.minor),
        format_weight(w.normal),
        format_weight(w.major),
        format_weight(w.critical),
        tsquery(language, query_param)
    )
}

fn format_weight(weight: f64) -> String {
    let clamped = weight.clamp(0.0, 1.0);
    let mut s = format!("{clamped:.4}");
    while s.ends_with('0') && !s.ends_with(".0") {
        s.pop();
    }
    s
}

/// Regex matching the tags whose text belongs to `bucket`.
///
/// The first quantifier is non-greedy so the whole expression matches the
/// shortest span (PostgreSQL derives the greediness of a regex from it).
pub(crate) fn html_heading_pattern(bucket: Bucket) -> Option<&'static str> {
    match bucket {
        Bucket::Critical => Some(r"<(h1|h2)[^>]*?>(.*?)</\1>"),
        Bucket::Major => Some(r"<(h3|h4|h5|h6)[^>]*?>(.*?)</\1>"),
        Bucket::Normal | Bucket::Minor => None,
    }
}

pub(crate) fn create_extract_html_function(name: &str) -> String {
    format!(
        "CREATE OR REPLACE FUNCTION {name}(content text, pattern text) RETURNS text
LANGUAGE sql IMMUTABLE PARALLEL SAFE AS $fn$
    SELECT coalesce(string_agg(regexp_replace(m[2], '<[^>]*>', ' ', 'g'), ' '), '')
    FROM regexp_matches(coalesce(content, ''), pattern, 'gi') AS m
$fn$"
    )
}

pub(crate) fn create_strip_html_function(name: &str) -> String {
    format!(
        "CREATE OR REPLACE FUNCTION {name}(content text) RETURNS text
LANGUAGE sql IMMUTABLE PARALLEL SAFE AS $fn$
    SELECT replace(replace(replace(replace(replace(
        regexp_replace(
            regexp_replace(coalesce(content, ''), '<(h[1-6]|script|style)[^>]*?>.*?</\\1>', ' ', 'gi'),
            '<[^>]*>', ' ', 'g'),
        '&nbsp;', ' '), '&lt;', '<'), '&gt;', '>'), '&quot;', '\"'), '&amp;', '&')
$fn$"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_orders_weights_from_minor_to_critical() {
        let sql = weighted_rank("t.doc", "simple", "query", &BucketWeights::default());
        assert_eq!(
            sql,
            "ts_rank('{0.1, 0.2, 0.5, 1.0}'::float4[], t.doc, to_tsquery('simple'::regconfig, :query))"
        );
    }

    #[test]
    fn weighted_vector_uses_bucket_label() {
        assert_eq!(
            weighted_tsvector("english", "t.title", Bucket::Major),
            "setweight(to_tsvector('english'::regconfig, t.title), 'B')"
        );
    }

    #[test]
    fn only_heading_buckets_have_patterns() {
        assert!(html_heading_pattern(Bucket::Critical).unwrap().contains("h1|h2"));
        assert!(html_heading_pattern(Bucket::Major).unwrap().contains("h6"));
        assert!(html_heading_pattern(Bucket::Normal).is_none());
    }

    #[test]
    fn html_functions_are_immutable() {
        assert!(create_extract_html_function("x_extract").contains("IMMUTABLE"));
        assert!(create_strip_html_function("x_strip").starts_with("CREATE OR REPLACE FUNCTION x_strip(content text)"));
    }
}
