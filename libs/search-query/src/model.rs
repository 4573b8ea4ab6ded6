//! Result types shared by the composition layer and database adapters.

use crate::error::{Error, Result};
use crate::sql::is_identifier;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::ops::Index;

/// Logical kind of search result, e.g. `document`.
///
/// Used in parameter names (`limit_<type>`) and SQL aliases, so it must be a
/// plain identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SearchResultTypeName(String);

impl SearchResultTypeName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if is_identifier(&name) {
            Ok(Self(name))
        } else {
            Err(Error::InvalidResultTypeName(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the per-type limit parameter.
    pub fn limit_parameter(&self) -> String {
        format!("limit_{}", self.0)
    }
}

impl fmt::Display for SearchResultTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SearchResultTypeName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SearchResultTypeName> for String {
    fn from(value: SearchResultTypeName) -> Self {
        value.0
    }
}

/// One merged search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    identifier: String,
    result_type: SearchResultTypeName,
    title: String,
    url: Option<String>,
    score: f64,
    match_count: i64,
    group_meta_data: JsonValue,
    meta_data: JsonValue,
}

impl SearchResult {
    /// Only database adapters construct results, from query rows.
    pub fn from_row(
        identifier: String,
        result_type: SearchResultTypeName,
        title: String,
        url: Option<String>,
        score: f64,
        match_count: i64,
        group_meta_data: JsonValue,
        meta_data: JsonValue,
    ) -> Self {
        Self {
            identifier,
            result_type,
            title,
            url,
            score,
            match_count,
            group_meta_data,
            meta_data,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn result_type(&self) -> &SearchResultTypeName {
        &self.result_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn match_count(&self) -> i64 {
        self.match_count
    }

    pub fn group_meta_data(&self) -> &JsonValue {
        &self.group_meta_data
    }

    pub fn meta_data(&self) -> &JsonValue {
        &self.meta_data
    }
}

/// Ordered search hits plus the time the database took to produce them.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    results: Vec<SearchResult>,
    query_execution_time_ms: f64,
}

impl SearchResults {
    pub fn new(results: Vec<SearchResult>, query_execution_time_ms: f64) -> Self {
        Self {
            results,
            query_execution_time_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SearchResult> {
        self.results.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchResult> {
        self.results.iter()
    }

    pub fn query_execution_time_ms(&self) -> f64 {
        self.query_execution_time_ms
    }
}

impl Index<usize> for SearchResults {
    type Output = SearchResult;

    fn index(&self, index: usize) -> &Self::Output {
        &self.results[index]
    }
}

impl<'a> IntoIterator for &'a SearchResults {
    type Item = &'a SearchResult;
    type IntoIter = std::slice::Iter<'a, SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
