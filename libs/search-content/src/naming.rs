//! Names of the database objects a content schema owns.
//!
//! Schema, source and filter strategies all derive names from here, so the
//! objects created, dropped, refreshed and queried always agree.

use sift_query::sql::schema_of;

/// Default object prefix for a schema id: `sift_<id>`, lowercased, with
/// every character outside `[a-z0-9_]` replaced by `_`.
pub fn default_prefix(schema_id: &str) -> String {
    let sanitized: String = schema_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("sift_{sanitized}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNames {
    /// Schema of the content table, if qualified.
    namespace: Option<String>,
    prefix: String,
}

impl SchemaNames {
    pub fn new(table: &str, prefix: &str) -> Self {
        Self {
            namespace: schema_of(table).map(str::to_string),
            prefix: prefix.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn qualify(&self, name: String) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}.{name}"),
            None => name,
        }
    }

    /// Generated `tsvector` column on the content table.
    pub fn fulltext_column(&self) -> String {
        format!("{}_fulltext", self.prefix)
    }

    /// Index name as used in `CREATE INDEX` (never qualified).
    pub fn fulltext_index(&self) -> String {
        format!("{}_fulltext_idx", self.prefix)
    }

    /// Index name as used in `DROP INDEX`.
    pub fn qualified_fulltext_index(&self) -> String {
        self.qualify(self.fulltext_index())
    }

    pub fn extract_html_function(&self) -> String {
        self.qualify(format!("{}_extract_html", self.prefix))
    }

    pub fn strip_html_function(&self) -> String {
        self.qualify(format!("{}_strip_html", self.prefix))
    }

    pub fn lookup_table(&self) -> String {
        self.qualify(format!("{}_lookup", self.prefix))
    }

    pub fn lookup_index(&self) -> String {
        format!("{}_lookup_content_idx", self.prefix)
    }

    pub fn qualified_lookup_index(&self) -> String {
        self.qualify(self.lookup_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prefix_is_an_identifier() {
        assert_eq!(default_prefix("Pages"), "sift_pages");
        assert_eq!(default_prefix("news-2024"), "sift_news_2024");
    }

    #[test]
    fn qualifies_objects_with_the_table_schema() {
        let names = SchemaNames::new("cms.pages", "sift_pages");
        assert_eq!(names.fulltext_column(), "sift_pages_fulltext");
        assert_eq!(names.fulltext_index(), "sift_pages_fulltext_idx");
        assert_eq!(names.qualified_fulltext_index(), "cms.sift_pages_fulltext_idx");
        assert_eq!(names.lookup_table(), "cms.sift_pages_lookup");

        let plain = SchemaNames::new("pages", "p");
        assert_eq!(plain.strip_html_function(), "p_strip_html");
        assert_eq!(plain.qualified_lookup_index(), "p_lookup_content_idx");
    }
}
