use indexmap::IndexMap;
use serde_json::json;
use sift_query::{Database, Options, SchemaConfiguration, SchemaTool, StrategyRegistry};
use std::collections::BTreeSet;

fn content_options(table: &str) -> Options {
    json!({
        "table": table,
        "id_column": "page_id",
        "language": "english",
        "columns": {
            "title": {"bucket": "critical"},
            "body": {"bucket": "normal", "html": true},
            "summary": "major"
        },
        "lookup": format!("SELECT page_id::text AS content_id, site FROM {table}")
    })
    .as_object()
    .cloned()
    .unwrap()
}

fn registry() -> StrategyRegistry {
    let mut registry = StrategyRegistry::new();
    sift_content::register(&mut registry);
    registry
}

/// Identifiers starting with `prefix`.
fn object_names(sql: &str, prefix: &str) -> BTreeSet<String> {
    sql.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|token| token.starts_with(prefix))
        .map(str::to_string)
        .collect()
}

#[test]
fn drop_names_every_object_create_names() {
    let registry = registry();
    let mut schemas = IndexMap::new();
    schemas.insert(
        "pages".to_string(),
        SchemaConfiguration::new("pages", sift_content::CONTENT)
            .with_refresher(sift_content::CONTENT_LOOKUP)
            .with_options(content_options("pages")),
    );
    let tool = SchemaTool::new(Database::Postgres, &registry, &schemas);

    let create = tool.create_schema_sql().unwrap();
    let drop = tool.drop_schema_sql().unwrap();
    let created = object_names(&create, "sift_pages");
    let dropped = object_names(&drop, "sift_pages");

    let expected: BTreeSet<String> = [
        "sift_pages_extract_html",
        "sift_pages_strip_html",
        "sift_pages_fulltext",
        "sift_pages_fulltext_idx",
        "sift_pages_lookup",
        "sift_pages_lookup_content_idx",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();
    assert_eq!(created, expected);
    assert!(created.is_subset(&dropped), "not dropped: {:?}", created.difference(&dropped));
}

#[test]
fn create_and_drop_are_idempotent_statements() {
    let registry = registry();
    let mut schemas = IndexMap::new();
    schemas.insert(
        "pages".to_string(),
        SchemaConfiguration::new("pages", sift_content::CONTENT).with_options(content_options("cms.pages")),
    );
    let tool = SchemaTool::new(Database::Postgres, &registry, &schemas);

    for statement in &tool.create_script().unwrap().sections()[0].statements {
        assert!(
            statement.contains("IF NOT EXISTS") || statement.starts_with("CREATE OR REPLACE"),
            "not idempotent: {statement}"
        );
    }
    let drop = tool.drop_script().unwrap();
    for statement in &drop.sections()[0].statements {
        assert!(statement.contains("IF EXISTS"), "not idempotent: {statement}");
    }

    // Objects live next to the qualified content table.
    let drop_sql = drop.render();
    assert!(drop_sql.contains("DROP INDEX IF EXISTS cms.sift_pages_fulltext_idx"));
    assert!(drop_sql.contains("DROP TABLE IF EXISTS cms.sift_pages_lookup"));
    assert!(drop_sql.contains("DROP FUNCTION IF EXISTS cms.sift_pages_extract_html(text, text)"));
}

#[test]
fn schemas_sharing_a_strategy_keep_separate_objects() {
    let registry = registry();
    let mut schemas = IndexMap::new();
    schemas.insert(
        "pages".to_string(),
        SchemaConfiguration::new("pages", sift_content::CONTENT).with_options(content_options("pages")),
    );
    schemas.insert(
        "news".to_string(),
        SchemaConfiguration::new("news", sift_content::CONTENT).with_options(content_options("news")),
    );
    let tool = SchemaTool::new(Database::Postgres, &registry, &schemas);

    let create = tool.create_schema_sql().unwrap();
    assert!(create.find("-- START OF CREATE SCHEMA 'pages'").unwrap()
        < create.find("-- START OF CREATE SCHEMA 'news'").unwrap());
    assert!(create.contains("ALTER TABLE news ADD COLUMN IF NOT EXISTS sift_news_fulltext"));

    let refresh = tool.refresh_dependencies_sql(None).unwrap();
    assert!(refresh.is_empty(), "no refresher configured");
}

#[test]
fn refresh_repopulates_lookup() {
    let registry = registry();
    let mut schemas = IndexMap::new();
    schemas.insert(
        "pages".to_string(),
        SchemaConfiguration::new("pages", sift_content::CONTENT)
            .with_refresher(sift_content::CONTENT_LOOKUP)
            .with_options(content_options("pages")),
    );
    let tool = SchemaTool::new(Database::Postgres, &registry, &schemas);

    let sql = tool.refresh_dependencies_sql(Some("pages")).unwrap();
    assert_eq!(
        sql,
        "-- START OF REFRESH SCHEMA 'pages'\n\
         TRUNCATE sift_pages_lookup;\n\
         INSERT INTO sift_pages_lookup\n\
         SELECT page_id::text AS content_id, site FROM pages;\n\
         -- END OF REFRESH SCHEMA 'pages'\n\n"
    );
}
