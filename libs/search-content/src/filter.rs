//! Result filter joining a content source to the rows it describes.

use crate::naming::default_prefix;
use crate::source::SourceSettings;
use serde_json::Value as JsonValue;
use sift_query::dialect::string_literal;
use sift_query::sql::{identifier, qualified_identifier};
use sift_query::{
    mappers, Database, Error, Options, OptionsExt, QueryParameters, Result, ResultFilter,
    SearchResultTypeName, SqlType, ValueMapper,
};

/// How a filter parameter is typed and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// `column = value`
    Text,
    /// `column = ANY(values)`
    TextArray,
    /// `column @> value`
    Json,
    /// `column = value`
    Integer,
    Boolean,
}

impl ParameterKind {
    fn parse(path: &str, value: &str) -> Result<Self> {
        match value {
            "text" => Ok(Self::Text),
            "text_array" => Ok(Self::TextArray),
            "json" => Ok(Self::Json),
            "integer" => Ok(Self::Integer),
            "boolean" => Ok(Self::Boolean),
            other => Err(Error::config(
                path,
                format!("unknown parameter type '{other}' (expected text, text_array, json, integer or boolean)"),
            )),
        }
    }

    fn mapper(self) -> ValueMapper {
        match self {
            Self::Text => mappers::text(),
            Self::TextArray => mappers::text_array(),
            Self::Json => mappers::json_text(),
            Self::Integer => mappers::integer(),
            Self::Boolean => mappers::boolean(),
        }
    }

    fn sql_type(self) -> SqlType {
        match self {
            Self::Text | Self::Json => SqlType::Text,
            Self::TextArray => SqlType::TextArray,
            Self::Integer => SqlType::BigInt,
            Self::Boolean => SqlType::Boolean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParameter {
    pub name: String,
    pub column: String,
    pub kind: ParameterKind,
}

/// Validated options of a `content` filter.
#[derive(Debug, Clone)]
pub struct ContentFilterOptions {
    /// Source id whose CTE the filter selects from, default `content`.
    ///
    /// Must be one of the filter's configured `sources`: the CTE of any other
    /// source is never defined and the statement fails only when executed.
    pub source: String,
    pub join_table: Option<String>,
    pub join_column: String,
    pub id_column: Option<String>,
    pub title_column: Option<String>,
    pub url_column: Option<String>,
    pub meta_columns: Vec<String>,
    pub parameters: Vec<FilterParameter>,
}

impl ContentFilterOptions {
    pub fn from_options(filter_id: &str, options: &Options) -> Result<Self> {
        let path = format!("filters.{filter_id}.options");

        let source = options.opt_str(&path, "source")?.unwrap_or(crate::CONTENT).to_string();
        let lookup_schema = options.opt_str(&path, "lookup_schema")?;
        let join_table = options.opt_table(&path, "join_table")?;
        let join_table = match (lookup_schema, join_table) {
            (Some(_), Some(_)) => {
                return Err(Error::config(
                    &path,
                    "set either 'lookup_schema' or 'join_table', not both",
                ));
            }
            (Some(schema_id), None) => Some(format!("{}_lookup", default_prefix(schema_id))),
            (None, table) => table.map(str::to_string),
        };
        let join_column = match options.opt_identifier(&path, "join_column")? {
            Some(column) => column.to_string(),
            None if lookup_schema.is_some() => "content_id".to_string(),
            None => "id".to_string(),
        };

        let mut meta_columns = Vec::new();
        for column in options.opt_string_list(&path, "meta_columns")? {
            identifier(&column)
                .map_err(|e| Error::config(format!("{path}.meta_columns"), e.to_string()))?;
            meta_columns.push(column);
        }

        let mut parameters = Vec::new();
        if let Some(declared) = options.opt_object(&path, "parameters")? {
            for (name, spec) in declared {
                parameters.push(parameter(&format!("{path}.parameters.{name}"), name, spec)?);
            }
        }

        Ok(Self {
            source,
            join_table,
            join_column,
            id_column: options.opt_identifier(&path, "id_column")?.map(str::to_string),
            title_column: options.opt_identifier(&path, "title_column")?.map(str::to_string),
            url_column: options.opt_identifier(&path, "url_column")?.map(str::to_string),
            meta_columns,
            parameters,
        })
    }
}

fn parameter(path: &str, name: &str, spec: &JsonValue) -> Result<FilterParameter> {
    identifier(name).map_err(|e| Error::config(path, e.to_string()))?;
    let JsonValue::Object(spec) = spec else {
        return Err(Error::InvalidValue {
            path: path.to_string(),
            expected: "object",
            observed: sift_query::params::describe(spec),
        });
    };
    let column = spec.opt_identifier(path, "column")?.unwrap_or(name).to_string();
    let kind = ParameterKind::parse(&format!("{path}.type"), spec.opt_str(path, "type")?.unwrap_or("text"))?;
    Ok(FilterParameter {
        name: name.to_string(),
        column,
        kind,
    })
}

/// The `content` filter strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentFilter;

impl ContentFilter {
    fn condition(dialect: Database, filter_id: &str, parameter: &FilterParameter) -> Result<String> {
        let placeholder = dialect.typed_placeholder(
            &sift_query::params::qualified_name(filter_id, &parameter.name),
            parameter.kind.sql_type(),
        )?;
        let column = format!("j.{}", parameter.column);
        let test = match parameter.kind {
            ParameterKind::Text | ParameterKind::Integer | ParameterKind::Boolean => {
                format!("{column} = {placeholder}")
            }
            ParameterKind::TextArray => format!("{column}::text = ANY({placeholder})"),
            ParameterKind::Json => format!("{column} @> {}", dialect.cast(&placeholder, SqlType::Json)?),
        };
        Ok(format!("({placeholder} IS NULL OR {test})"))
    }
}

impl ResultFilter for ContentFilter {
    fn filter_query_part(
        &self,
        dialect: Database,
        filter_id: &str,
        result_type: &SearchResultTypeName,
        query_options: &Options,
        filter_options: &Options,
    ) -> Result<String> {
        let options = ContentFilterOptions::from_options(filter_id, filter_options)?;
        let source = SourceSettings::resolve(&options.source, query_options, filter_options)?;
        let cte = source.cte_name();

        let (join_table, join_column) = match &options.join_table {
            Some(table) => (qualified_identifier(table)?.to_string(), options.join_column.clone()),
            None => (source.table.clone(), source.id_column.clone()),
        };
        let id_column = options.id_column.as_deref().unwrap_or(&join_column);
        let title = match &options.title_column {
            Some(column) => format!("coalesce(j.{column}::text, '')"),
            None => "''".to_string(),
        };
        let url = match &options.url_column {
            Some(column) => format!("j.{column}::text"),
            None => "NULL::text".to_string(),
        };

        let mut meta = vec![("filter".to_string(), string_literal(filter_id))];
        meta.extend(
            options
                .meta_columns
                .iter()
                .map(|column| (column.clone(), format!("j.{column}"))),
        );
        let meta_data = dialect.json_object(&meta)?;
        let score = dialect.cast("src.score", SqlType::Float)?;

        let conditions = options
            .parameters
            .iter()
            .map(|p| Self::condition(dialect, filter_id, p))
            .collect::<Result<Vec<_>>>()?;
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("\nWHERE {}", conditions.join("\n  AND "))
        };

        Ok(format!(
            "SELECT j.{id_column}::text AS result_id,\n    \
             {result_type_literal} AS result_type,\n    \
             {title} AS result_title,\n    \
             {url} AS result_url,\n    \
             {score} AS score,\n    \
             {meta_data} AS meta_data\n\
             FROM {cte} src\n\
             JOIN {join_table} j ON j.{join_column}::text = src.content_id{where_clause}",
            result_type_literal = string_literal(result_type.as_str()),
        ))
    }

    fn query_parameters(
        &self,
        _dialect: Database,
        filter_id: &str,
        filter_options: &Options,
    ) -> Result<QueryParameters> {
        let options = ContentFilterOptions::from_options(filter_id, filter_options)?;
        Ok(options
            .parameters
            .iter()
            .fold(QueryParameters::new(), |params, p| {
                params.with(filter_id, &p.name, p.kind.mapper())
            }))
    }
}
