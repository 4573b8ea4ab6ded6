//! Query parameters, bind values and value mappers.
//!
//! Filters declare their parameters as fully-qualified name -> mapper pairs.
//! Mappers are pure functions from the raw JSON input to a typed
//! [`BindValue`]; they only run when a prepared search is bound, never while a
//! query is assembled.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Separator between filter id and local parameter name.
pub const NAMESPACE_SEPARATOR: &str = "__";

/// Reserved parameter carrying the search term.
pub const QUERY_PARAMETER: &str = "query";

/// Reserved parameter carrying the global result limit.
pub const GLOBAL_LIMIT_PARAMETER: &str = "global_limit";

/// `filterId__localName`.
pub fn qualified_name(filter_id: &str, local_name: &str) -> String {
    format!("{filter_id}{NAMESPACE_SEPARATOR}{local_name}")
}

/// Typed, nullable value handed to the database driver.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(Option<String>),
    TextArray(Option<Vec<String>>),
    Integer(Option<i64>),
    Float(Option<f64>),
    Bool(Option<bool>),
    Json(Option<JsonValue>),
}

impl BindValue {
    pub fn is_null(&self) -> bool {
        match self {
            Self::Text(v) => v.is_none(),
            Self::TextArray(v) => v.is_none(),
            Self::Integer(v) => v.is_none(),
            Self::Float(v) => v.is_none(),
            Self::Bool(v) => v.is_none(),
            Self::Json(v) => v.is_none(),
        }
    }

    /// Bind value for a parameter without a declared mapper.
    pub fn infer(value: Option<&JsonValue>) -> Self {
        match value {
            None | Some(JsonValue::Null) => Self::Text(None),
            Some(JsonValue::Bool(b)) => Self::Bool(Some(*b)),
            Some(JsonValue::Number(n)) => match n.as_i64() {
                Some(i) => Self::Integer(Some(i)),
                None => Self::Float(n.as_f64()),
            },
            Some(JsonValue::String(s)) => Self::Text(Some(s.clone())),
            Some(JsonValue::Array(items)) if items.iter().all(is_scalar) => {
                Self::TextArray(Some(items.iter().filter_map(scalar_to_string).collect()))
            }
            Some(other) => Self::Json(Some(other.clone())),
        }
    }
}

fn is_scalar(value: &JsonValue) -> bool {
    matches!(
        value,
        JsonValue::String(_) | JsonValue::Number(_) | JsonValue::Bool(_)
    )
}

fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Result of applying a mapper; the error is a human readable reason.
pub type MapperResult = std::result::Result<BindValue, String>;

/// Pure coercion from raw JSON input to a bind value.
pub type ValueMapper = Arc<dyn Fn(Option<&JsonValue>) -> MapperResult + Send + Sync>;

/// Built-in value mappers.
pub mod mappers {
    use super::*;

    fn present(value: Option<&JsonValue>) -> Option<&JsonValue> {
        value.filter(|v| !v.is_null())
    }

    pub fn text() -> ValueMapper {
        Arc::new(|value| match present(value) {
            None => Ok(BindValue::Text(None)),
            Some(v) => scalar_to_string(v)
                .map(|s| BindValue::Text(Some(s)))
                .ok_or_else(|| format!("expected a scalar, found {}", describe(v))),
        })
    }

    /// Wrap a scalar or a list of scalars into a text array.
    pub fn text_array() -> ValueMapper {
        Arc::new(|value| match present(value) {
            None => Ok(BindValue::TextArray(None)),
            Some(JsonValue::Array(items)) => items
                .iter()
                .map(|item| {
                    scalar_to_string(item)
                        .ok_or_else(|| format!("expected scalar list items, found {}", describe(item)))
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(|items| BindValue::TextArray(Some(items))),
            Some(v) => scalar_to_string(v)
                .map(|s| BindValue::TextArray(Some(vec![s])))
                .ok_or_else(|| format!("expected a scalar or list, found {}", describe(v))),
        })
    }

    /// Serialize a structured value to JSON text.
    pub fn json_text() -> ValueMapper {
        Arc::new(|value| match present(value) {
            None => Ok(BindValue::Text(None)),
            Some(v) => serde_json::to_string(v)
                .map(|s| BindValue::Text(Some(s)))
                .map_err(|e| e.to_string()),
        })
    }

    pub fn integer() -> ValueMapper {
        Arc::new(|value| match present(value) {
            None => Ok(BindValue::Integer(None)),
            Some(JsonValue::Number(n)) => n
                .as_i64()
                .map(|i| BindValue::Integer(Some(i)))
                .ok_or_else(|| format!("expected an integer, found number {n}")),
            Some(JsonValue::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(|i| BindValue::Integer(Some(i)))
                .map_err(|_| format!("expected an integer, found string {s:?}")),
            Some(v) => Err(format!("expected an integer, found {}", describe(v))),
        })
    }

    pub fn float() -> ValueMapper {
        Arc::new(|value| match present(value) {
            None => Ok(BindValue::Float(None)),
            Some(JsonValue::Number(n)) => Ok(BindValue::Float(n.as_f64())),
            Some(JsonValue::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(|f| BindValue::Float(Some(f)))
                .map_err(|_| format!("expected a number, found string {s:?}")),
            Some(v) => Err(format!("expected a number, found {}", describe(v))),
        })
    }

    pub fn boolean() -> ValueMapper {
        Arc::new(|value| match present(value) {
            None => Ok(BindValue::Bool(None)),
            Some(JsonValue::Bool(b)) => Ok(BindValue::Bool(Some(*b))),
            Some(JsonValue::String(s)) if s == "true" || s == "false" => {
                Ok(BindValue::Bool(Some(s == "true")))
            }
            Some(v) => Err(format!("expected a boolean, found {}", describe(v))),
        })
    }
}

/// Short description of a JSON value's type and content for error messages.
pub fn describe(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "null".to_string(),
        JsonValue::Bool(b) => format!("boolean {b}"),
        JsonValue::Number(n) => format!("number {n}"),
        JsonValue::String(s) => format!("string {s:?}"),
        JsonValue::Array(items) => format!("array of {} element(s)", items.len()),
        JsonValue::Object(map) => format!("object with {} key(s)", map.len()),
    }
}

/// Fully-qualified parameter name -> value mapper, in declaration order.
#[derive(Clone, Default)]
pub struct QueryParameters {
    mappers: IndexMap<String, ValueMapper>,
}

impl QueryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `local_name` for `filter_id`.
    pub fn with(mut self, filter_id: &str, local_name: &str, mapper: ValueMapper) -> Self {
        self.mappers
            .insert(qualified_name(filter_id, local_name), mapper);
        self
    }

    /// Insert under an already qualified name, returning any mapper it replaced.
    pub fn insert(&mut self, name: String, mapper: ValueMapper) -> Option<ValueMapper> {
        self.mappers.insert(name, mapper)
    }

    pub fn get(&self, name: &str) -> Option<&ValueMapper> {
        self.mappers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mappers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.mappers.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ValueMapper)> {
        self.mappers.iter()
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }
}

impl fmt::Debug for QueryParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.mappers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_array_wraps_scalars_and_lists() {
        let m = mappers::text_array();
        assert_eq!(
            m(Some(&json!("a"))).unwrap(),
            BindValue::TextArray(Some(vec!["a".into()]))
        );
        assert_eq!(
            m(Some(&json!(["a", 2]))).unwrap(),
            BindValue::TextArray(Some(vec!["a".into(), "2".into()]))
        );
        assert_eq!(m(None).unwrap(), BindValue::TextArray(None));
        assert_eq!(m(Some(&json!(null))).unwrap(), BindValue::TextArray(None));
        assert!(m(Some(&json!([{"a": 1}]))).is_err());
    }

    #[test]
    fn json_text_serializes_structures() {
        let m = mappers::json_text();
        assert_eq!(
            m(Some(&json!({"lang": "de"}))).unwrap(),
            BindValue::Text(Some("{\"lang\":\"de\"}".into()))
        );
        assert!(m(None).unwrap().is_null());
    }

    #[test]
    fn scalar_mappers_coerce_strings() {
        assert_eq!(
            mappers::integer()(Some(&json!("42"))).unwrap(),
            BindValue::Integer(Some(42))
        );
        assert!(mappers::integer()(Some(&json!(1.5))).is_err());
        assert_eq!(
            mappers::boolean()(Some(&json!("true"))).unwrap(),
            BindValue::Bool(Some(true))
        );
        assert_eq!(
            mappers::float()(Some(&json!(2))).unwrap(),
            BindValue::Float(Some(2.0))
        );
        assert!(mappers::text()(Some(&json!([1]))).is_err());
    }

    #[test]
    fn infers_from_json_type() {
        assert_eq!(BindValue::infer(None), BindValue::Text(None));
        assert_eq!(BindValue::infer(Some(&json!(3))), BindValue::Integer(Some(3)));
        assert_eq!(
            BindValue::infer(Some(&json!(["x", "y"]))),
            BindValue::TextArray(Some(vec!["x".into(), "y".into()]))
        );
        assert_eq!(
            BindValue::infer(Some(&json!({"a": 1}))),
            BindValue::Json(Some(json!({"a": 1})))
        );
    }

    #[test]
    fn parameters_are_namespaced_per_filter() {
        let params = QueryParameters::new()
            .with("f1", "siteNode", mappers::text())
            .with("f2", "siteNode", mappers::text());
        let names: Vec<&str> = params.names().collect();
        assert_eq!(names, vec!["f1__siteNode", "f2__siteNode"]);
        assert!(!params.contains("siteNode"));
    }
}
