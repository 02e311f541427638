use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::error::SchemaError;
use crate::filter::ast::{Comparator, Condition, FilterValue};

/// Semantic type of a record property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    #[serde(alias = "title", alias = "rich_text")]
    Text,
    #[serde(alias = "checkbox")]
    Boolean,
    Number,
    #[serde(alias = "timestamp")]
    Date,
    #[serde(alias = "select", alias = "status")]
    Option,
    #[serde(alias = "option-list", alias = "multi_select")]
    OptionList,
}

const BOOLEAN_COMPARATORS: &[Comparator] = &[Comparator::Equals, Comparator::NotEquals];

const NUMBER_COMPARATORS: &[Comparator] = &[
    Comparator::Equals,
    Comparator::NotEquals,
    Comparator::IsEmpty,
    Comparator::IsNotEmpty,
    Comparator::GreaterThan,
    Comparator::LessThan,
    Comparator::GreaterThanOrEqualTo,
    Comparator::LessThanOrEqualTo,
];

const TEXT_COMPARATORS: &[Comparator] = &[
    Comparator::Equals,
    Comparator::NotEquals,
    Comparator::Contains,
    Comparator::NotContains,
    Comparator::IsEmpty,
    Comparator::IsNotEmpty,
];

const OPTION_LIST_COMPARATORS: &[Comparator] = &[
    Comparator::Contains,
    Comparator::NotContains,
    Comparator::IsEmpty,
    Comparator::IsNotEmpty,
];

const DATE_COMPARATORS: &[Comparator] = &[
    Comparator::Equals,
    Comparator::NotEquals,
    Comparator::IsEmpty,
    Comparator::IsNotEmpty,
    Comparator::Before,
    Comparator::After,
    Comparator::OnOrBefore,
    Comparator::OnOrAfter,
];

impl PropertyType {
    /// Comparators valid for this type, in the order a filter builder offers them.
    pub fn comparators(self) -> &'static [Comparator] {
        match self {
            PropertyType::Boolean => BOOLEAN_COMPARATORS,
            PropertyType::Number => NUMBER_COMPARATORS,
            PropertyType::Text | PropertyType::Option => TEXT_COMPARATORS,
            PropertyType::OptionList => OPTION_LIST_COMPARATORS,
            PropertyType::Date => DATE_COMPARATORS,
        }
    }

    pub fn allows(self, comparator: Comparator) -> bool {
        self.comparators().contains(&comparator)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PropertyType::Text => "text",
            PropertyType::Boolean => "boolean",
            PropertyType::Number => "number",
            PropertyType::Date => "date",
            PropertyType::Option => "option",
            PropertyType::OptionList => "option_list",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(JsonValue::String(s.to_string())).ok()
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared property types of a record collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    properties: IndexMap<String, PropertyType>,
}

impl Default for Schema {
    /// Columns of the stock records table.
    fn default() -> Self {
        Schema::empty()
            .with("title", PropertyType::Text)
            .with("checkbox", PropertyType::Boolean)
            .with("date", PropertyType::Date)
            .with("multiSelect", PropertyType::OptionList)
            .with("number", PropertyType::Number)
            .with("richText", PropertyType::Text)
            .with("select", PropertyType::Option)
            .with("timestamp", PropertyType::Date)
            .with("status", PropertyType::Option)
    }
}

impl Schema {
    pub fn empty() -> Self {
        Self {
            properties: IndexMap::new(),
        }
    }

    pub fn with(mut self, property: impl Into<String>, ty: PropertyType) -> Self {
        self.insert(property, ty);
        self
    }

    pub fn insert(&mut self, property: impl Into<String>, ty: PropertyType) {
        self.properties.insert(property.into(), ty);
    }

    pub fn get(&self, property: &str) -> Option<PropertyType> {
        self.properties.get(property).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, PropertyType)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Valid comparators for a property; undeclared properties get the text set.
    pub fn comparators_for(&self, property: &str) -> &'static [Comparator] {
        self.get(property).unwrap_or(PropertyType::Text).comparators()
    }

    /// The condition a fresh filter starts from: first text property, first
    /// text comparator, empty value.
    pub fn default_condition(&self) -> Condition {
        let property = self
            .iter()
            .find(|(_, ty)| *ty == PropertyType::Text)
            .map_or("title", |(name, _)| name);

        Condition::new(property, TEXT_COMPARATORS[0], Some(FilterValue::Text(String::new())))
    }

    /// Reads `{"properties": {"name": "type", ...}}`.
    pub fn from_json(value: &JsonValue) -> Result<Schema, SchemaError> {
        let properties = value
            .get("properties")
            .and_then(JsonValue::as_object)
            .ok_or(SchemaError::MissingProperties)?;

        let mut schema = Schema::empty();
        for (name, raw) in properties {
            let ty = raw
                .as_str()
                .and_then(PropertyType::parse)
                .ok_or_else(|| SchemaError::UnknownType {
                    property: name.clone(),
                    ty: raw.to_string(),
                })?;
            schema.insert(name.clone(), ty);
        }
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_comparator_tables() {
        assert!(PropertyType::Boolean.allows(Comparator::Equals));
        assert!(!PropertyType::Boolean.allows(Comparator::IsEmpty));
        assert!(PropertyType::Number.allows(Comparator::GreaterThanOrEqualTo));
        assert!(!PropertyType::OptionList.allows(Comparator::Equals));
        assert!(PropertyType::Date.allows(Comparator::OnOrAfter));
        assert!(PropertyType::Option.allows(Comparator::Contains));
        assert_eq!(PropertyType::Number.comparators().len(), 8);
    }

    #[test]
    fn test_type_aliases() {
        assert_eq!(PropertyType::parse("timestamp"), Some(PropertyType::Date));
        assert_eq!(
            PropertyType::parse("multi_select"),
            Some(PropertyType::OptionList)
        );
        assert_eq!(
            PropertyType::parse("option-list"),
            Some(PropertyType::OptionList)
        );
        assert_eq!(PropertyType::parse("rich_text"), Some(PropertyType::Text));
        assert_eq!(PropertyType::parse("formula"), None);
    }

    #[test]
    fn test_comparators_for_undeclared_property() {
        let schema = Schema::default();
        assert_eq!(schema.comparators_for("checkbox"), BOOLEAN_COMPARATORS);
        assert_eq!(schema.comparators_for("nickname"), TEXT_COMPARATORS);
    }

    #[test]
    fn test_default_condition() {
        let condition = Schema::default().default_condition();
        assert_eq!(condition.property, "title");
        assert_eq!(condition.comparator, Comparator::Equals);
        assert_eq!(condition.value, Some(FilterValue::Text(String::new())));
    }

    #[test]
    fn test_from_json() {
        let schema = Schema::from_json(&json!({
            "properties": {"Name": "title", "Done": "checkbox", "Due": "date"}
        }))
        .unwrap();
        assert_eq!(schema.get("Name"), Some(PropertyType::Text));
        assert_eq!(schema.get("Done"), Some(PropertyType::Boolean));
        assert_eq!(schema.get("Due"), Some(PropertyType::Date));

        assert!(matches!(
            Schema::from_json(&json!({"properties": {"x": "rollup"}})),
            Err(SchemaError::UnknownType { .. })
        ));
        assert!(matches!(
            Schema::from_json(&json!({})),
            Err(SchemaError::MissingProperties)
        ));
    }
}
