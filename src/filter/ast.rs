use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

use crate::record::parse_instant;

/// A filter tree: a leaf condition or a group of child expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterExpr {
    Condition(Condition),
    Group(Group),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub property: String,
    pub comparator: Comparator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FilterValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub operator: LogicalOperator,
    #[serde(default, alias = "children")]
    pub filters: Vec<FilterExpr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    IsEmpty,
    IsNotEmpty,
    GreaterThan,
    LessThan,
    GreaterThanOrEqualTo,
    LessThanOrEqualTo,
    Before,
    After,
    OnOrBefore,
    OnOrAfter,
    /// Any tag this build does not know. Evaluates as a no-op. The original
    /// tag is not kept: it serializes back as `"unknown"`.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    #[serde(alias = "AND")]
    And,
    #[serde(alias = "OR")]
    Or,
    /// Any other operator tag. Evaluates to an empty result and
    /// serializes back as `"unknown"`.
    #[serde(other)]
    Unknown,
}

/// Comparison operand. Strings stay `Text` on deserialization; dates are
/// resolved by schema validation or parsed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    Date(DateTime<Utc>),
}

impl Comparator {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Equals => "equals",
            Comparator::NotEquals => "not_equals",
            Comparator::Contains => "contains",
            Comparator::NotContains => "not_contains",
            Comparator::IsEmpty => "is_empty",
            Comparator::IsNotEmpty => "is_not_empty",
            Comparator::GreaterThan => "greater_than",
            Comparator::LessThan => "less_than",
            Comparator::GreaterThanOrEqualTo => "greater_than_or_equal_to",
            Comparator::LessThanOrEqualTo => "less_than_or_equal_to",
            Comparator::Before => "before",
            Comparator::After => "after",
            Comparator::OnOrBefore => "on_or_before",
            Comparator::OnOrAfter => "on_or_after",
            Comparator::Unknown => "unknown",
        }
    }

    /// Tag lookup; unrecognized tags map to `Unknown`.
    pub fn parse(s: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(s.to_ascii_lowercase()))
            .unwrap_or(Comparator::Unknown)
    }

    /// Human-readable form: `not_equals` -> `not equals`.
    pub fn label(self) -> String {
        self.as_str().replace('_', " ")
    }

    /// Whether the comparator ignores its value.
    pub fn is_unary(self) -> bool {
        matches!(self, Comparator::IsEmpty | Comparator::IsNotEmpty)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => f.write_str("AND"),
            LogicalOperator::Or => f.write_str("OR"),
            LogicalOperator::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

impl FilterValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FilterValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FilterValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// A date operand, parsing text that was never resolved by validation.
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FilterValue::Date(d) => Some(*d),
            FilterValue::Text(s) => parse_instant(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FilterValue::Bool(_) => "boolean",
            FilterValue::Number(_) => "number",
            FilterValue::Text(_) => "text",
            FilterValue::List(_) => "list",
            FilterValue::Date(_) => "date",
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Bool(b) => write!(f, "{}", b),
            FilterValue::Number(n) => write!(f, "{}", n),
            FilterValue::Text(s) => write_quoted(f, s),
            FilterValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%dT%H:%M:%SZ")),
            FilterValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_quoted(f, item)?;
                }
                write!(f, "]")
            }
        }
    }
}

// Quotes and backslashes are escaped so the parser reads the text back.
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        if matches!(c, '"' | '\\') {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

impl Condition {
    pub fn new(
        property: impl Into<String>,
        comparator: Comparator,
        value: Option<FilterValue>,
    ) -> Self {
        Self {
            property: property.into(),
            comparator,
            value,
        }
    }
}

impl FilterExpr {
    pub fn condition(
        property: impl Into<String>,
        comparator: Comparator,
        value: FilterValue,
    ) -> Self {
        FilterExpr::Condition(Condition::new(property, comparator, Some(value)))
    }

    /// A condition without an operand (`is_empty`, `is_not_empty`).
    pub fn unary(property: impl Into<String>, comparator: Comparator) -> Self {
        FilterExpr::Condition(Condition::new(property, comparator, None))
    }

    pub fn and(filters: Vec<FilterExpr>) -> Self {
        FilterExpr::Group(Group {
            operator: LogicalOperator::And,
            filters,
        })
    }

    pub fn or(filters: Vec<FilterExpr>) -> Self {
        FilterExpr::Group(Group {
            operator: LogicalOperator::Or,
            filters,
        })
    }

    /// The "no filter applied" expression: an empty AND passes everything.
    pub fn none() -> Self {
        FilterExpr::and(Vec::new())
    }
}

impl Default for FilterExpr {
    fn default() -> Self {
        FilterExpr::none()
    }
}

/// Renders in the text query syntax accepted by [`crate::filter::parse`].
impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::Condition(c) => {
                write!(f, "{} {}", c.property, c.comparator)?;
                match &c.value {
                    Some(value) if !c.comparator.is_unary() => write!(f, " {}", value),
                    _ => Ok(()),
                }
            }
            FilterExpr::Group(g) => {
                write!(f, "(")?;
                for (i, child) in g.filters.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", g.operator)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}
