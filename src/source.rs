use serde_json::Value as JsonValue;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::filter::FilterExpr;
use crate::notion;
use crate::record::{records_from_json, Record};
use crate::schema::Schema;

/// Shape of the records document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordFormat {
    /// A JSON array of flat record objects.
    #[default]
    Records,
    /// A saved database-query response.
    Notion,
}

fn is_yaml(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "yaml" || ext == "yml")
}

/// Reads a JSON or YAML document; `-` reads JSON from stdin.
pub fn read_document(path: &Path) -> Result<JsonValue> {
    if path == Path::new("-") {
        let mut content = String::new();
        io::stdin().lock().read_to_string(&mut content)?;
        return Ok(serde_json::from_str(&content)?);
    }

    let content = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = content.len(), "read document");
    parse_document(&content, is_yaml(path))
}

pub fn parse_document(content: &str, yaml: bool) -> Result<JsonValue> {
    if yaml {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}

/// Decodes records. An explicit schema wins; otherwise the stock table schema
/// is used for flat records and the derived one for query responses.
pub fn load_records(
    document: JsonValue,
    format: RecordFormat,
    schema: Option<Schema>,
) -> Result<(Vec<Record>, Schema)> {
    let (records, schema) = match format {
        RecordFormat::Records => {
            let schema = schema.unwrap_or_default();
            (records_from_json(&document, &schema)?, schema)
        }
        RecordFormat::Notion => {
            let (records, derived) = notion::records_from_response(document)?;
            (records, schema.unwrap_or(derived))
        }
    };
    debug!(count = records.len(), "loaded records");
    Ok((records, schema))
}

pub fn load_schema(path: &Path) -> Result<Schema> {
    let document = read_document(path)?;
    Ok(Schema::from_json(&document)?)
}

pub fn load_filter(path: &Path) -> Result<FilterExpr> {
    let document = read_document(path)?;
    Ok(serde_json::from_value(document)?)
}
