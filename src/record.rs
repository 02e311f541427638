use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::error::RecordError;
use crate::schema::{PropertyType, Schema};

static NULL: PropertyValue = PropertyValue::Null;

/// Stable identity of a record, used to de-duplicate OR results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag palette of select-like properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Gray,
    Brown,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Red,
    GrayBackground,
    BrownBackground,
    OrangeBackground,
    YellowBackground,
    GreenBackground,
    BlueBackground,
    PurpleBackground,
    PinkBackground,
    RedBackground,
    #[default]
    #[serde(other)]
    Default,
}

/// A single named, colored tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
    #[serde(default)]
    pub color: Color,
}

impl SelectOption {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Color::Default,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Text(String),
    Bool(bool),
    Number(f64),
    Date(DateTime<Utc>),
    Option(SelectOption),
    OptionList(Vec<SelectOption>),
}

impl PropertyValue {
    /// Null, an empty string, or an empty option list.
    pub fn is_empty(&self) -> bool {
        match self {
            PropertyValue::Null => true,
            PropertyValue::Text(s) => s.is_empty(),
            PropertyValue::OptionList(list) => list.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            PropertyValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_option_list(&self) -> Option<&[SelectOption]> {
        match self {
            PropertyValue::OptionList(list) => Some(list),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Text(_) => "text",
            PropertyValue::Bool(_) => "boolean",
            PropertyValue::Number(_) => "number",
            PropertyValue::Date(_) => "date",
            PropertyValue::Option(_) => "option",
            PropertyValue::OptionList(_) => "option_list",
        }
    }

    /// Decodes a JSON value, typed by the schema when the property is declared.
    pub fn from_json(value: &JsonValue, ty: Option<PropertyType>) -> Option<PropertyValue> {
        if value.is_null() {
            return Some(PropertyValue::Null);
        }

        match ty {
            Some(PropertyType::Text) => value
                .as_str()
                .map(|s| PropertyValue::Text(s.to_string())),
            Some(PropertyType::Boolean) => value.as_bool().map(PropertyValue::Bool),
            Some(PropertyType::Number) => value.as_f64().map(PropertyValue::Number),
            Some(PropertyType::Date) => value
                .as_str()
                .and_then(parse_instant)
                .map(PropertyValue::Date),
            Some(PropertyType::Option) => json_to_option(value).map(PropertyValue::Option),
            Some(PropertyType::OptionList) => {
                json_to_option_list(value).map(PropertyValue::OptionList)
            }
            None => infer_from_json(value),
        }
    }
}

fn infer_from_json(value: &JsonValue) -> Option<PropertyValue> {
    match value {
        JsonValue::Null => Some(PropertyValue::Null),
        JsonValue::Bool(b) => Some(PropertyValue::Bool(*b)),
        JsonValue::Number(n) => n.as_f64().map(PropertyValue::Number),
        JsonValue::String(s) => Some(PropertyValue::Text(s.clone())),
        JsonValue::Object(_) => json_to_option(value).map(PropertyValue::Option),
        JsonValue::Array(_) => json_to_option_list(value).map(PropertyValue::OptionList),
    }
}

fn json_to_option(value: &JsonValue) -> Option<SelectOption> {
    match value {
        JsonValue::String(s) => Some(SelectOption::new(s.clone())),
        JsonValue::Object(_) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    }
}

fn json_to_option_list(value: &JsonValue) -> Option<Vec<SelectOption>> {
    value.as_array()?.iter().map(json_to_option).collect()
}

/// Parses an instant: RFC 3339, a naive date-time taken as UTC, or a bare
/// `YYYY-MM-DD` taken as UTC midnight.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Anything the evaluator can filter: an identity plus keyed property values.
pub trait Filterable {
    fn id(&self) -> &RecordId;

    fn property(&self, key: &str) -> Option<&PropertyValue>;

    /// Absent properties read as null.
    fn value(&self, key: &str) -> &PropertyValue {
        self.property(key).unwrap_or(&NULL)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub properties: IndexMap<String, PropertyValue>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(id),
            properties: IndexMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Builds a record from a flat JSON object carrying an `id` key.
    pub fn from_json(value: &JsonValue, schema: &Schema) -> Result<Record, RecordError> {
        let object = value.as_object().ok_or(RecordError::NotAnObject)?;

        let id = match object.get("id") {
            Some(JsonValue::String(s)) => RecordId::new(s.clone()),
            Some(JsonValue::Number(n)) => RecordId::new(n.to_string()),
            _ => return Err(RecordError::MissingId),
        };

        let mut properties = IndexMap::with_capacity(object.len().saturating_sub(1));
        for (key, raw) in object {
            if key == "id" {
                continue;
            }
            let ty = schema.get(key);
            let value =
                PropertyValue::from_json(raw, ty).ok_or_else(|| RecordError::InvalidProperty {
                    id: id.to_string(),
                    property: key.clone(),
                    expected: ty.map_or("a known value shape", PropertyType::as_str),
                })?;
            properties.insert(key.clone(), value);
        }

        Ok(Record { id, properties })
    }
}

impl Filterable for Record {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.properties.len() + 1))?;
        map.serialize_entry("id", &self.id)?;
        for (key, value) in &self.properties {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Decodes a JSON array of record objects.
pub fn records_from_json(value: &JsonValue, schema: &Schema) -> Result<Vec<Record>, RecordError> {
    let items = value.as_array().ok_or(RecordError::NotAnArray)?;
    items.iter().map(|item| Record::from_json(item, schema)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_instant_formats() {
        let midnight = parse_instant("2024-01-15").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2024-01-15T00:00:00+00:00");

        let naive = parse_instant("2024-01-15T12:00:00").unwrap();
        assert_eq!(naive.to_rfc3339(), "2024-01-15T12:00:00+00:00");

        let offset = parse_instant("2024-01-15T12:00:00+02:00").unwrap();
        assert_eq!(offset.to_rfc3339(), "2024-01-15T10:00:00+00:00");

        assert!(parse_instant("yesterday").is_none());
    }

    #[test]
    fn test_record_from_json_with_schema() {
        let raw = json!({
            "id": "1",
            "title": "Launch",
            "checkbox": true,
            "date": "2024-01-15",
            "multiSelect": [{"name": "urgent", "color": "red"}, "vip"],
            "number": 10,
            "select": {"name": "High", "color": "orange"},
            "status": null
        });

        let record = Record::from_json(&raw, &Schema::default()).unwrap();
        assert_eq!(record.id.as_str(), "1");
        assert_eq!(record.value("title"), &PropertyValue::Text("Launch".into()));
        assert!(matches!(record.value("date"), PropertyValue::Date(_)));
        assert_eq!(record.value("status"), &PropertyValue::Null);
        assert_eq!(record.value("missing"), &PropertyValue::Null);

        let tags = record.value("multiSelect").as_option_list().unwrap();
        assert_eq!(tags[0].color, Color::Red);
        assert_eq!(tags[1], SelectOption::new("vip"));
    }

    #[test]
    fn test_untyped_properties_follow_json_shape() {
        let raw = json!({"id": 7, "note": "2024-01-15", "score": 3.5});
        let record = Record::from_json(&raw, &Schema::empty()).unwrap();
        assert_eq!(record.id.as_str(), "7");
        assert_eq!(
            record.value("note"),
            &PropertyValue::Text("2024-01-15".into())
        );
        assert_eq!(record.value("score"), &PropertyValue::Number(3.5));
    }

    #[test]
    fn test_record_errors() {
        let schema = Schema::default();
        assert!(matches!(
            Record::from_json(&json!({"title": "x"}), &schema),
            Err(RecordError::MissingId)
        ));
        assert!(matches!(
            Record::from_json(&json!({"id": "1", "number": "ten"}), &schema),
            Err(RecordError::InvalidProperty { .. })
        ));
        assert!(matches!(
            Record::from_json(&json!([1, 2]), &schema),
            Err(RecordError::NotAnObject)
        ));
    }

    #[test]
    fn test_unknown_color_falls_back_to_default() {
        let option: SelectOption =
            serde_json::from_value(json!({"name": "x", "color": "teal"})).unwrap();
        assert_eq!(option.color, Color::Default);

        let known: Color = serde_json::from_value(json!("blue_background")).unwrap();
        assert_eq!(known, Color::BlueBackground);
        assert_eq!(
            serde_json::to_value(Color::default()).unwrap(),
            json!("default")
        );
    }

    #[test]
    fn test_record_serializes_id_first() {
        let record = Record::new("1")
            .with("number", PropertyValue::Number(10.0))
            .with("select", PropertyValue::Option(SelectOption::new("High")));
        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(
            out,
            json!({"id": "1", "number": 10.0, "select": {"name": "High", "color": "default"}})
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(PropertyValue::Null.is_empty());
        assert!(PropertyValue::Text(String::new()).is_empty());
        assert!(PropertyValue::OptionList(vec![]).is_empty());
        assert!(!PropertyValue::Number(0.0).is_empty());
        assert!(!PropertyValue::Bool(false).is_empty());
    }
}
