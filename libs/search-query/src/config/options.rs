//! Typed access to free-form strategy options.
//!
//! Strategy options are plain JSON objects. Accessors take the path of the
//! object inside the configuration so errors point at the offending key.

use crate::error::{Error, Result};
use crate::params::describe;
use crate::sql::{self, TrustedSql};
use serde_json::Value as JsonValue;

/// Free-form strategy options.
pub type Options = serde_json::Map<String, JsonValue>;

/// Merge `overrides` over `base`. Nested objects merge key by key, any other
/// value in `overrides` replaces the base value.
pub fn merge_options(base: &Options, overrides: &Options) -> Options {
    let mut merged = base.clone();
    for (key, value) in overrides {
        match (merged.get_mut(key), value) {
            (Some(JsonValue::Object(existing)), JsonValue::Object(patch)) => {
                *existing = merge_options(existing, patch);
            }
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

fn key_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn invalid(path: &str, key: &str, expected: &'static str, observed: &JsonValue) -> Error {
    Error::InvalidValue {
        path: key_path(path, key),
        expected,
        observed: describe(observed),
    }
}

/// Typed accessors over [`Options`].
pub trait OptionsExt {
    fn opt_str(&self, path: &str, key: &str) -> Result<Option<&str>>;
    fn opt_f64(&self, path: &str, key: &str) -> Result<Option<f64>>;
    fn opt_bool(&self, path: &str, key: &str) -> Result<Option<bool>>;
    fn opt_object(&self, path: &str, key: &str) -> Result<Option<&Options>>;
    fn opt_string_list(&self, path: &str, key: &str) -> Result<Vec<String>>;

    fn require_str(&self, path: &str, key: &str) -> Result<&str> {
        self.opt_str(path, key)?
            .ok_or_else(|| Error::config(key_path(path, key), "missing required value"))
    }

    /// A bare SQL identifier such as a column name.
    fn opt_identifier(&self, path: &str, key: &str) -> Result<Option<&str>> {
        match self.opt_str(path, key)? {
            Some(name) => sql::identifier(name)
                .map(Some)
                .map_err(|_| Error::config(key_path(path, key), format!("'{name}' is not a valid SQL identifier"))),
            None => Ok(None),
        }
    }

    /// A possibly schema-qualified table name.
    fn opt_table(&self, path: &str, key: &str) -> Result<Option<&str>> {
        match self.opt_str(path, key)? {
            Some(name) => sql::qualified_identifier(name)
                .map(Some)
                .map_err(|_| Error::config(key_path(path, key), format!("'{name}' is not a valid table name"))),
            None => Ok(None),
        }
    }

    /// Operator-authored SQL fragment.
    fn trusted_sql(&self, path: &str, key: &str) -> Result<Option<TrustedSql>> {
        match self.opt_str(path, key)? {
            Some(value) => TrustedSql::from_config(&key_path(path, key), value).map(Some),
            None => Ok(None),
        }
    }
}

impl OptionsExt for Options {
    fn opt_str(&self, path: &str, key: &str) -> Result<Option<&str>> {
        match self.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(invalid(path, key, "string", other)),
        }
    }

    fn opt_f64(&self, path: &str, key: &str) -> Result<Option<f64>> {
        match self.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::Number(n)) => Ok(n.as_f64()),
            Some(other) => Err(invalid(path, key, "number", other)),
        }
    }

    fn opt_bool(&self, path: &str, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(invalid(path, key, "boolean", other)),
        }
    }

    fn opt_object(&self, path: &str, key: &str) -> Result<Option<&Options>> {
        match self.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::Object(map)) => Ok(Some(map)),
            Some(other) => Err(invalid(path, key, "object", other)),
        }
    }

    fn opt_string_list(&self, path: &str, key: &str) -> Result<Vec<String>> {
        match self.get(key) {
            None | Some(JsonValue::Null) => Ok(Vec::new()),
            Some(JsonValue::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| match item {
                    JsonValue::String(s) => Ok(s.clone()),
                    other => Err(Error::InvalidValue {
                        path: format!("{}[{idx}]", key_path(path, key)),
                        expected: "string",
                        observed: describe(other),
                    }),
                })
                .collect(),
            Some(other) => Err(invalid(path, key, "array of strings", other)),
        }
    }
}
