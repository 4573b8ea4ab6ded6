mod support;

use indexmap::IndexMap;
use sift_query::{Database, Error, SchemaConfiguration, SchemaTool, SchemaVerb};
use support::registry;

fn schemas() -> IndexMap<String, SchemaConfiguration> {
    let mut schemas = IndexMap::new();
    schemas.insert(
        "pages".to_string(),
        SchemaConfiguration::new("pages", "lookup").with_refresher("lookup"),
    );
    schemas.insert("assets".to_string(), SchemaConfiguration::new("assets", "lookup"));
    schemas
}

#[test]
fn create_script_follows_declaration_order() {
    let registry = registry();
    let schemas = schemas();
    let tool = SchemaTool::new(Database::Postgres, &registry, &schemas);

    let sql = tool.create_schema_sql().unwrap();
    let pages = sql.find("-- START OF CREATE SCHEMA 'pages'").unwrap();
    let assets = sql.find("-- START OF CREATE SCHEMA 'assets'").unwrap();
    assert!(pages < assets);
    assert!(sql.contains("CREATE TABLE IF NOT EXISTS pages_lookup (content_id text);\n"));
    assert!(sql.contains("-- END OF CREATE SCHEMA 'assets'"));
}

#[test]
fn drop_script_names_every_created_object() {
    let registry = registry();
    let schemas = schemas();
    let tool = SchemaTool::new(Database::Postgres, &registry, &schemas);

    let create = tool.create_script().unwrap();
    let drop = tool.drop_script().unwrap();
    assert_eq!(create.sections().len(), drop.sections().len());
    assert!(drop.sections().iter().all(|s| s.verb == SchemaVerb::Drop));

    let drop_sql = drop.render();
    for name in ["pages_lookup", "pages_lookup_idx", "assets_lookup", "assets_lookup_idx"] {
        assert!(drop_sql.contains(name), "{name} is not dropped");
    }
}

#[test]
fn refresh_skips_schemas_without_refresher() {
    let registry = registry();
    let schemas = schemas();
    let tool = SchemaTool::new(Database::Postgres, &registry, &schemas);

    let all = tool.refresh_script(None).unwrap();
    assert_eq!(all.sections().len(), 1);
    assert_eq!(all.sections()[0].schema_id, "pages");

    let assets = tool.refresh_script(Some("assets")).unwrap();
    assert!(assets.is_empty());
}

#[test]
fn refresh_filter_must_name_a_schema() {
    let registry = registry();
    let schemas = schemas();
    let tool = SchemaTool::new(Database::Postgres, &registry, &schemas);

    let err = tool.refresh_dependencies_sql(Some("missing")).unwrap_err();
    assert!(matches!(err, Error::SchemaFilterMismatch(ref id) if id == "missing"));
    assert_eq!(
        err.to_string(),
        "schema filter does not point to an existing configuration: 'missing'"
    );
}

#[test]
fn unknown_schema_strategy_fails() {
    let registry = registry();
    let mut schemas = schemas();
    schemas.insert("broken".to_string(), SchemaConfiguration::new("broken", "nope"));
    let tool = SchemaTool::new(Database::Postgres, &registry, &schemas);
    assert!(matches!(
        tool.create_script(),
        Err(Error::UnknownStrategy { .. })
    ));
}
