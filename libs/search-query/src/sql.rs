//! Trusted SQL fragments and identifier checks.
//!
//! Operator-authored configuration may carry raw SQL (scoring formulas,
//! metadata expressions, lookup selects). Those values are wrapped in
//! [`TrustedSql`], which has no conversion from arbitrary strings, so search
//! input can only ever reach the database as a bound parameter.

use crate::error::{Error, Result};
use std::fmt;

/// A SQL fragment taken verbatim from trusted configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedSql(String);

impl TrustedSql {
    /// Wrap a configuration value found at `path`.
    pub fn from_config(path: &str, value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(Error::config(path, "SQL fragment must not be empty"));
        }
        if trimmed.contains(';') {
            return Err(Error::config(
                path,
                "SQL fragment must be a single expression without ';'",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Fragments authored in this workspace.
    pub(crate) fn from_static(sql: &'static str) -> Self {
        Self(sql.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrustedSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check that `name` is a bare identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate an identifier that is spliced into SQL.
pub fn identifier(name: &str) -> Result<&str> {
    if is_identifier(name) {
        Ok(name)
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

/// Validate an optionally schema-qualified name such as `public.pages`.
pub fn qualified_identifier(name: &str) -> Result<&str> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|p| is_identifier(p)) {
        Ok(name)
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

/// Schema part of a qualified name, if any.
pub fn schema_of(qualified: &str) -> Option<&str> {
    qualified.split_once('.').map(|(schema, _)| schema)
}
