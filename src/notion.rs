//! Maps a saved database-query response into records.
//!
//! Each page's properties arrive as `{"type": t, t: payload}`. Supported
//! property types become typed record values; the rest are skipped.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{Error, RecordError};
use crate::record::{parse_instant, PropertyValue, Record, RecordId, SelectOption};
use crate::schema::{PropertyType, Schema};

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: IndexMap<String, JsonValue>,
}

#[derive(Debug, Deserialize)]
struct RichText {
    #[serde(default)]
    plain_text: String,
}

#[derive(Debug, Deserialize)]
struct DateRange {
    start: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PageProperty {
    Title { title: Vec<RichText> },
    RichText { rich_text: Vec<RichText> },
    Number { number: Option<f64> },
    Checkbox { checkbox: bool },
    Select { select: Option<SelectOption> },
    Status { status: Option<SelectOption> },
    MultiSelect { multi_select: Vec<SelectOption> },
    Date { date: Option<DateRange> },
    CreatedTime { created_time: String },
    LastEditedTime { last_edited_time: String },
    #[serde(other)]
    Unsupported,
}

fn join_text(parts: Vec<RichText>) -> String {
    parts.into_iter().map(|p| p.plain_text).collect()
}

fn to_instant(page: &str, raw: &str) -> Result<PropertyValue, RecordError> {
    parse_instant(raw)
        .map(PropertyValue::Date)
        .ok_or_else(|| RecordError::InvalidPage {
            id: page.to_string(),
            message: format!("invalid date '{}'", raw),
        })
}

type Converted = Option<(PropertyType, PropertyValue)>;

fn convert(page: &str, property: PageProperty) -> Result<Converted, RecordError> {
    let converted = match property {
        PageProperty::Title { title } => {
            (PropertyType::Text, PropertyValue::Text(join_text(title)))
        }
        PageProperty::RichText { rich_text } => {
            (PropertyType::Text, PropertyValue::Text(join_text(rich_text)))
        }
        PageProperty::Number { number } => (
            PropertyType::Number,
            number.map_or(PropertyValue::Null, PropertyValue::Number),
        ),
        PageProperty::Checkbox { checkbox } => {
            (PropertyType::Boolean, PropertyValue::Bool(checkbox))
        }
        PageProperty::Select { select: option } | PageProperty::Status { status: option } => (
            PropertyType::Option,
            option.map_or(PropertyValue::Null, PropertyValue::Option),
        ),
        PageProperty::MultiSelect { multi_select } => {
            (PropertyType::OptionList, PropertyValue::OptionList(multi_select))
        }
        PageProperty::Date { date } => match date {
            Some(range) => (PropertyType::Date, to_instant(page, &range.start)?),
            None => (PropertyType::Date, PropertyValue::Null),
        },
        PageProperty::CreatedTime { created_time: raw }
        | PageProperty::LastEditedTime {
            last_edited_time: raw,
        } => (PropertyType::Date, to_instant(page, &raw)?),
        PageProperty::Unsupported => return Ok(None),
    };
    Ok(Some(converted))
}

impl QueryResponse {
    /// Converts every page into a record and derives the schema from the
    /// property types seen.
    pub fn into_records(self) -> Result<(Vec<Record>, Schema), Error> {
        if self.has_more {
            debug!(
                cursor = ?self.next_cursor,
                "response has further pages, using the saved page only"
            );
        }

        let mut schema = Schema::empty();
        let mut records = Vec::with_capacity(self.results.len());

        for page in self.results {
            let mut properties = IndexMap::with_capacity(page.properties.len());
            for (name, raw) in page.properties {
                let property: PageProperty =
                    serde_json::from_value(raw).map_err(|e| RecordError::InvalidPage {
                        id: page.id.clone(),
                        message: format!("property '{}': {}", name, e),
                    })?;
                match convert(&page.id, property)? {
                    Some((ty, value)) => {
                        if schema.get(&name).is_none() {
                            schema.insert(name.clone(), ty);
                        }
                        properties.insert(name, value);
                    }
                    None => debug!(
                        page = %page.id,
                        property = %name,
                        "skipping unsupported property type"
                    ),
                }
            }
            records.push(Record {
                id: RecordId::new(page.id),
                properties,
            });
        }

        Ok((records, schema))
    }
}

pub fn records_from_response(value: JsonValue) -> Result<(Vec<Record>, Schema), Error> {
    let response: QueryResponse = serde_json::from_value(value)?;
    response.into_records()
}
