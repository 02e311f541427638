use std::collections::HashSet;
use tracing::trace;

use super::ast::{Comparator, Condition, FilterExpr, FilterValue, Group, LogicalOperator};
use super::comparators::{self, DateEquality};
use crate::record::Filterable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalOptions {
    pub date_equality: DateEquality,
}

/// Filters `records` by `expr`, keeping input order.
pub fn evaluate<'a, R: Filterable>(records: &'a [R], expr: &FilterExpr) -> Vec<&'a R> {
    evaluate_with(records, expr, EvalOptions::default())
}

pub fn evaluate_with<'a, R: Filterable>(
    records: &'a [R],
    expr: &FilterExpr,
    options: EvalOptions,
) -> Vec<&'a R> {
    let input: Vec<&'a R> = records.iter().collect();
    evaluate_refs(&input, expr, options)
}

/// Same as [`evaluate_with`] over an already borrowed collection.
pub fn evaluate_refs<'a, R: Filterable>(
    records: &[&'a R],
    expr: &FilterExpr,
    options: EvalOptions,
) -> Vec<&'a R> {
    if records.is_empty() {
        return Vec::new();
    }
    match expr {
        FilterExpr::Condition(condition) => apply_condition(records, condition, options),
        FilterExpr::Group(group) => apply_group(records, group, options),
    }
}

fn apply_group<'a, R: Filterable>(
    records: &[&'a R],
    group: &Group,
    options: EvalOptions,
) -> Vec<&'a R> {
    match group.operator {
        // Each child narrows what the previous one left.
        LogicalOperator::And => {
            let mut result = records.to_vec();
            for child in &group.filters {
                result = evaluate_refs(&result, child, options);
            }
            result
        }
        // Each child sees the full input; first appearance wins.
        LogicalOperator::Or => {
            let mut seen = HashSet::new();
            let mut result = Vec::new();
            for child in &group.filters {
                for record in evaluate_refs(records, child, options) {
                    if seen.insert(record.id()) {
                        result.push(record);
                    }
                }
            }
            result
        }
        LogicalOperator::Unknown => {
            trace!("unknown logical operator, group matches nothing");
            Vec::new()
        }
    }
}

fn apply_condition<'a, R: Filterable>(
    records: &[&'a R],
    condition: &Condition,
    options: EvalOptions,
) -> Vec<&'a R> {
    let property = condition.property.as_str();
    let value = condition.value.as_ref();

    trace!(property, comparator = %condition.comparator, "applying condition");

    match condition.comparator {
        Comparator::Equals => match value {
            Some(v) => comparators::equals_with(records, property, v, options.date_equality),
            None => Vec::new(),
        },
        Comparator::NotEquals => match value {
            Some(v) => comparators::not_equals_with(records, property, v, options.date_equality),
            None => records.to_vec(),
        },
        Comparator::Contains => match value {
            Some(FilterValue::Text(needle)) => comparators::contains(records, property, needle),
            Some(FilterValue::List(names)) => comparators::contains_all(records, property, names),
            _ => Vec::new(),
        },
        Comparator::NotContains => match value {
            Some(FilterValue::Text(needle)) => comparators::not_contains(records, property, needle),
            Some(FilterValue::List(names)) => {
                comparators::not_contains_any(records, property, names)
            }
            _ => records.to_vec(),
        },
        Comparator::IsEmpty => comparators::is_empty(records, property),
        Comparator::IsNotEmpty => comparators::is_not_empty(records, property),
        Comparator::GreaterThan => {
            with_number(value, |n| comparators::greater_than(records, property, n))
        }
        Comparator::LessThan => {
            with_number(value, |n| comparators::less_than(records, property, n))
        }
        Comparator::GreaterThanOrEqualTo => {
            with_number(value, |n| comparators::greater_than_or_equal_to(records, property, n))
        }
        Comparator::LessThanOrEqualTo => {
            with_number(value, |n| comparators::less_than_or_equal_to(records, property, n))
        }
        Comparator::Before => with_date(value, |d| comparators::before(records, property, d)),
        Comparator::After => with_date(value, |d| comparators::after(records, property, d)),
        Comparator::OnOrBefore => {
            with_date(value, |d| comparators::on_or_before(records, property, d))
        }
        Comparator::OnOrAfter => {
            with_date(value, |d| comparators::on_or_after(records, property, d))
        }
        Comparator::Unknown => {
            trace!(property, "unknown comparator, condition passes everything");
            records.to_vec()
        }
    }
}

fn with_number<'a, R, F>(value: Option<&FilterValue>, apply: F) -> Vec<&'a R>
where
    F: FnOnce(f64) -> Vec<&'a R>,
{
    value.and_then(FilterValue::as_number).map(apply).unwrap_or_default()
}

fn with_date<'a, R, F>(value: Option<&FilterValue>, apply: F) -> Vec<&'a R>
where
    F: FnOnce(chrono::DateTime<chrono::Utc>) -> Vec<&'a R>,
{
    value.and_then(FilterValue::as_date).map(apply).unwrap_or_default()
}
