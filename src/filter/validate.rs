//! Checks a filter tree against a schema and resolves its operands to the
//! property's type.

use super::ast::{Comparator, Condition, FilterExpr, FilterValue, Group, LogicalOperator};
use crate::error::FilterError;
use crate::record::parse_instant;
use crate::schema::{PropertyType, Schema};

impl Condition {
    /// Builds a condition whose comparator and operand fit `property`'s type.
    pub fn checked(
        schema: &Schema,
        property: impl Into<String>,
        comparator: Comparator,
        value: Option<FilterValue>,
    ) -> Result<Condition, FilterError> {
        check_condition(schema, Condition::new(property, comparator, value))
    }
}

impl Schema {
    /// Validates every condition of `expr`, returning the resolved tree.
    pub fn validate(&self, expr: &FilterExpr) -> Result<FilterExpr, FilterError> {
        validate(self, expr)
    }
}

pub fn validate(schema: &Schema, expr: &FilterExpr) -> Result<FilterExpr, FilterError> {
    match expr {
        FilterExpr::Condition(condition) => {
            check_condition(schema, condition.clone()).map(FilterExpr::Condition)
        }
        FilterExpr::Group(group) => {
            if group.operator == LogicalOperator::Unknown {
                return Err(FilterError::UnknownOperator);
            }
            let filters = group
                .filters
                .iter()
                .map(|child| validate(schema, child))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(FilterExpr::Group(Group {
                operator: group.operator,
                filters,
            }))
        }
    }
}

fn check_condition(schema: &Schema, condition: Condition) -> Result<Condition, FilterError> {
    let Condition {
        property,
        comparator,
        value,
    } = condition;

    if comparator == Comparator::Unknown {
        return Err(FilterError::UnknownComparator(property));
    }

    let Some(ty) = schema.get(&property) else {
        return Err(FilterError::UnknownProperty(property));
    };

    if !ty.allows(comparator) {
        return Err(FilterError::ComparatorNotAllowed {
            property,
            comparator,
            property_type: ty,
        });
    }

    if comparator.is_unary() {
        return Ok(Condition::new(property, comparator, None));
    }

    let Some(value) = value else {
        return Err(FilterError::MissingValue { property, comparator });
    };

    let value = resolve_value(&property, ty, value)?;
    Ok(Condition::new(property, comparator, Some(value)))
}

fn resolve_value(
    property: &str,
    ty: PropertyType,
    value: FilterValue,
) -> Result<FilterValue, FilterError> {
    let mismatch = |expected: &'static str, value: &FilterValue| FilterError::ValueTypeMismatch {
        property: property.to_string(),
        expected,
        actual: value.type_name(),
    };

    match (ty, value) {
        (PropertyType::Boolean, v @ FilterValue::Bool(_)) => Ok(v),
        (PropertyType::Number, v @ FilterValue::Number(_)) => Ok(v),
        (PropertyType::Text | PropertyType::Option, v @ FilterValue::Text(_)) => Ok(v),
        (PropertyType::OptionList, v @ (FilterValue::Text(_) | FilterValue::List(_))) => Ok(v),
        (PropertyType::Date, v @ FilterValue::Date(_)) => Ok(v),
        (PropertyType::Date, FilterValue::Text(s)) => match parse_instant(&s) {
            Some(d) => Ok(FilterValue::Date(d)),
            None => Err(FilterError::InvalidDate {
                property: property.to_string(),
                value: s,
            }),
        },
        (PropertyType::Boolean, v) => Err(mismatch("a boolean", &v)),
        (PropertyType::Number, v) => Err(mismatch("a number", &v)),
        (PropertyType::Text | PropertyType::Option, v) => Err(mismatch("text", &v)),
        (PropertyType::OptionList, v) => Err(mismatch("text or a list of names", &v)),
        (PropertyType::Date, v) => Err(mismatch("a date", &v)),
    }
}
