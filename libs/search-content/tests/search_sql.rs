use serde_json::{json, Value};
use sift_query::{
    BindValue, Database, LimitMode, SearchApi, SearchConfiguration, SearchInput, StrategyRegistry,
};
use std::sync::Arc;

fn configuration() -> Value {
    json!({
        "endpoints": {
            "site": {
                "query_options": {
                    "sources": {"content": {"table": "pages", "schema": "pages", "language": "english"}}
                },
                "filters": {
                    "pages": {
                        "filter": "content",
                        "result_type": "page",
                        "sources": ["content"],
                        "default_parameters": {"site": "main"},
                        "options": {
                            "lookup_schema": "pages",
                            "title_column": "title",
                            "url_column": "path",
                            "parameters": {"site": {"type": "text_array"}}
                        }
                    },
                    "downloads": {
                        "filter": "content",
                        "result_type": "asset",
                        "sources": ["content"],
                        "options": {
                            "join_table": "assets",
                            "join_column": "page_id",
                            "title_column": "filename",
                            "parameters": {"site": {"type": "text_array"}}
                        }
                    },
                    "archive": {
                        "filter": "content",
                        "result_type": "page",
                        "sources": ["content"],
                        "options": {
                            "sources": {"content": {"table": "archive"}},
                            "title_column": "title"
                        }
                    }
                },
                "type_aggregators": {
                    "page": {"options": {"score_aggregation": "max(score) + 0.1 * count(*)"}},
                    "asset": {}
                }
            }
        },
        "schemas": {
            "pages": {
                "schema": "content",
                "refresher": "content-lookup",
                "options": {"table": "pages", "columns": {"title": "critical", "body": {"html": true}}}
            }
        }
    })
}

fn api() -> SearchApi {
    let mut registry = StrategyRegistry::new();
    sift_content::register(&mut registry);
    let configuration = SearchConfiguration::from_value(&configuration()).unwrap();
    SearchApi::new(Database::Postgres, Arc::new(registry), Arc::new(configuration))
}

#[test]
fn filters_sharing_effective_source_options_share_one_cte() {
    let query = api().search_query("site", None, LimitMode::Global).unwrap();
    let ctes: Vec<&String> = query.source_fragments().keys().collect();
    // `pages` and `downloads` share the endpoint's source options; `archive`
    // overrides the table and gets its own CTE.
    assert_eq!(ctes.len(), 2);

    let sql = query.sql().unwrap();
    assert_eq!(sql.matches(&format!("{} AS (", ctes[0])).count(), 1);
    assert_eq!(sql.matches(&format!("FROM {} src", ctes[0])).count(), 2);
    assert_eq!(sql.matches(&format!("FROM {} src", ctes[1])).count(), 1);
    assert!(sql.contains("FROM archive t"));
}

#[test]
fn renders_identically_every_time() {
    let api = api();
    let first = api.search_query("site", None, LimitMode::PerType).unwrap().sql().unwrap();
    let second = api.search_query("site", None, LimitMode::PerType).unwrap().sql().unwrap();
    assert_eq!(first, second);
    assert!(first.contains("LIMIT :limit_page"));
    assert!(first.contains("LIMIT :limit_asset"));
    assert!(!first.contains("global_limit"));
}

#[test]
fn binds_defaults_explicit_values_and_reserved_parameters() {
    let input = SearchInput::with_global_limit("\"bone density\" OR scan", 20)
        .with_parameter("downloads", "site", json!("intranet"));
    let prepared = api().prepare_search("site", None, &input).unwrap();

    assert_eq!(
        prepared.parameter("query"),
        Some(&BindValue::Text(Some("((bone <-> density) | scan:*)".into())))
    );
    assert_eq!(
        prepared.parameter("pages__site"),
        Some(&BindValue::TextArray(Some(vec!["main".into()])))
    );
    assert_eq!(
        prepared.parameter("downloads__site"),
        Some(&BindValue::TextArray(Some(vec!["intranet".into()])))
    );
    assert_eq!(prepared.parameter("global_limit"), Some(&BindValue::Integer(Some(20))));

    // Every placeholder was rewritten and has exactly one value.
    assert!(!prepared.sql().contains(":query"));
    assert!(!prepared.sql().contains(":pages__site"));
    let positions = prepared.parameters().len();
    assert!(prepared.sql().contains(&format!("${positions}")));
    assert!(!prepared.sql().contains(&format!("${}", positions + 1)));
}

#[test]
fn query_option_overrides_change_the_source() {
    let overrides = json!({"sources": {"content": {"language": "german"}}});
    let query = api()
        .search_query("site", overrides.as_object(), LimitMode::Global)
        .unwrap();
    let sql = query.sql().unwrap();
    assert!(sql.contains("to_tsquery('german'::regconfig, :query)"));
    assert!(!sql.contains("'english'"));
}

#[test]
fn unknown_endpoint_is_reported() {
    let err = api().search_query("nope", None, LimitMode::Global).unwrap_err();
    assert_eq!(err.to_string(), "endpoint 'nope' is not configured");
}

#[test]
fn source_option_errors_point_at_their_origin() {
    let mut config = configuration();
    config["endpoints"]["site"]["query_options"]["sources"]["content"]["id_column"] = json!(5);
    let mut registry = StrategyRegistry::new();
    sift_content::register(&mut registry);
    let api = SearchApi::new(
        Database::Postgres,
        Arc::new(registry),
        Arc::new(SearchConfiguration::from_value(&config).unwrap()),
    );
    let err = api.search_query("site", None, LimitMode::Global).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid configuration at 'endpoints.site.query_options.sources.content.id_column': \
         expected string, found number 5"
    );

    let mut config = configuration();
    config["endpoints"]["site"]["filters"]["archive"]["options"]["sources"]["content"]["language"] =
        json!(["german"]);
    let mut registry = StrategyRegistry::new();
    sift_content::register(&mut registry);
    let api = SearchApi::new(
        Database::Postgres,
        Arc::new(registry),
        Arc::new(SearchConfiguration::from_value(&config).unwrap()),
    );
    let err = api.search_query("site", None, LimitMode::Global).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid configuration at 'endpoints.site.filters.archive.options.sources.content.language': \
         expected string, found array of 1 element(s)"
    );
}

#[test]
fn source_option_selects_a_non_default_source() {
    let config = json!({
        "endpoints": {
            "site": {
                "query_options": {"sources": {"news": {"table": "news", "schema": "news"}}},
                "filters": {
                    "news": {
                        "filter": "content",
                        "result_type": "article",
                        "sources": ["news"],
                        "options": {"source": "news", "title_column": "headline"}
                    }
                },
                "type_aggregators": {"article": {}}
            }
        }
    });
    let mut registry = StrategyRegistry::new();
    sift_content::register(&mut registry);
    registry.register_source("news", || sift_content::ContentSource);
    let api = SearchApi::new(
        Database::Postgres,
        Arc::new(registry),
        Arc::new(SearchConfiguration::from_value(&config).unwrap()),
    );

    let query = api.search_query("site", None, LimitMode::Global).unwrap();
    let cte = query.source_fragments().keys().next().unwrap().clone();
    assert!(cte.starts_with("src_news_"));
    let sql = query.sql().unwrap();
    assert!(sql.contains(&format!("FROM {cte} src\nJOIN news j ON j.id::text = src.content_id")));
}
