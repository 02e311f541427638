//! One filtering function per comparator.
//!
//! Every function keeps the input order and never fails. A record whose value
//! has the wrong runtime shape is dropped, except under `not_contains` and the
//! emptiness checks, where the shape rules below decide.

use chrono::{DateTime, Utc};

use super::ast::FilterValue;
use crate::record::{Filterable, PropertyValue};

/// How `equals`/`not_equals` treat date-valued properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateEquality {
    /// A filter date is never the same value as a record date, so `equals`
    /// admits nothing and `not_equals` admits everything.
    #[default]
    Identity,
    /// Compare by instant, like the before/after family.
    Instant,
}

fn retain<'a, R, F>(records: &[&'a R], property: &str, predicate: F) -> Vec<&'a R>
where
    R: Filterable,
    F: Fn(&PropertyValue) -> bool,
{
    records
        .iter()
        .copied()
        .filter(|record| predicate(record.value(property)))
        .collect()
}

fn value_equals(item: &PropertyValue, value: &FilterValue, dates: DateEquality) -> bool {
    match (item, value) {
        (PropertyValue::Option(option), FilterValue::Text(name)) => option.name == *name,
        (PropertyValue::Text(a), FilterValue::Text(b)) => a == b,
        (PropertyValue::Bool(a), FilterValue::Bool(b)) => a == b,
        (PropertyValue::Number(a), FilterValue::Number(b)) => a == b,
        (PropertyValue::Date(a), _) => match dates {
            DateEquality::Identity => false,
            DateEquality::Instant => value
                .as_date()
                .is_some_and(|b| a.timestamp_millis() == b.timestamp_millis()),
        },
        _ => false,
    }
}

pub fn equals<'a, R: Filterable>(
    records: &[&'a R],
    property: &str,
    value: &FilterValue,
) -> Vec<&'a R> {
    equals_with(records, property, value, DateEquality::Identity)
}

pub fn equals_with<'a, R: Filterable>(
    records: &[&'a R],
    property: &str,
    value: &FilterValue,
    dates: DateEquality,
) -> Vec<&'a R> {
    retain(records, property, |item| value_equals(item, value, dates))
}

pub fn not_equals<'a, R: Filterable>(
    records: &[&'a R],
    property: &str,
    value: &FilterValue,
) -> Vec<&'a R> {
    not_equals_with(records, property, value, DateEquality::Identity)
}

pub fn not_equals_with<'a, R: Filterable>(
    records: &[&'a R],
    property: &str,
    value: &FilterValue,
    dates: DateEquality,
) -> Vec<&'a R> {
    retain(records, property, |item| !value_equals(item, value, dates))
}

pub fn is_empty<'a, R: Filterable>(records: &[&'a R], property: &str) -> Vec<&'a R> {
    retain(records, property, PropertyValue::is_empty)
}

pub fn is_not_empty<'a, R: Filterable>(records: &[&'a R], property: &str) -> Vec<&'a R> {
    retain(records, property, |item| match item {
        PropertyValue::Null => false,
        PropertyValue::Text(s) => !s.is_empty(),
        PropertyValue::OptionList(list) => !list.is_empty(),
        _ => true,
    })
}

fn compare_number<'a, R, F>(records: &[&'a R], property: &str, cmp: F) -> Vec<&'a R>
where
    R: Filterable,
    F: Fn(f64) -> bool,
{
    retain(records, property, |item| item.as_number().is_some_and(&cmp))
}

pub fn greater_than<'a, R: Filterable>(
    records: &[&'a R],
    property: &str,
    value: f64,
) -> Vec<&'a R> {
    compare_number(records, property, |n| n > value)
}

pub fn less_than<'a, R: Filterable>(records: &[&'a R], property: &str, value: f64) -> Vec<&'a R> {
    compare_number(records, property, |n| n < value)
}

pub fn greater_than_or_equal_to<'a, R: Filterable>(
    records: &[&'a R],
    property: &str,
    value: f64,
) -> Vec<&'a R> {
    compare_number(records, property, |n| n >= value)
}

pub fn less_than_or_equal_to<'a, R: Filterable>(
    records: &[&'a R],
    property: &str,
    value: f64,
) -> Vec<&'a R> {
    compare_number(records, property, |n| n <= value)
}

// Dates compare at millisecond precision.
fn compare_date<'a, R, F>(records: &[&'a R], property: &str, cmp: F) -> Vec<&'a R>
where
    R: Filterable,
    F: Fn(i64) -> bool,
{
    retain(records, property, |item| {
        item.as_date().is_some_and(|d| cmp(d.timestamp_millis()))
    })
}

pub fn before<'a, R: Filterable>(
    records: &[&'a R],
    property: &str,
    value: DateTime<Utc>,
) -> Vec<&'a R> {
    let bound = value.timestamp_millis();
    compare_date(records, property, |t| t < bound)
}

pub fn after<'a, R: Filterable>(
    records: &[&'a R],
    property: &str,
    value: DateTime<Utc>,
) -> Vec<&'a R> {
    let bound = value.timestamp_millis();
    compare_date(records, property, |t| t > bound)
}

pub fn on_or_before<'a, R: Filterable>(
    records: &[&'a R],
    property: &str,
    value: DateTime<Utc>,
) -> Vec<&'a R> {
    let bound = value.timestamp_millis();
    compare_date(records, property, |t| t <= bound)
}

pub fn on_or_after<'a, R: Filterable>(
    records: &[&'a R],
    property: &str,
    value: DateTime<Utc>,
) -> Vec<&'a R> {
    let bound = value.timestamp_millis();
    compare_date(records, property, |t| t >= bound)
}

fn contains_value(item: &PropertyValue, needle: &str) -> Option<bool> {
    match item {
        PropertyValue::Text(s) => Some(s.contains(needle)),
        PropertyValue::OptionList(list) => Some(list.iter().any(|option| option.name == needle)),
        _ => None,
    }
}

/// Substring match on text, name match on option lists.
pub fn contains<'a, R: Filterable>(records: &[&'a R], property: &str, needle: &str) -> Vec<&'a R> {
    retain(records, property, |item| contains_value(item, needle).unwrap_or(false))
}

pub fn not_contains<'a, R: Filterable>(
    records: &[&'a R],
    property: &str,
    needle: &str,
) -> Vec<&'a R> {
    retain(records, property, |item| !contains_value(item, needle).unwrap_or(false))
}

/// Option lists holding every one of `names`.
pub fn contains_all<'a, R: Filterable>(
    records: &[&'a R],
    property: &str,
    names: &[String],
) -> Vec<&'a R> {
    if names.is_empty() {
        return records.to_vec();
    }
    retain(records, property, |item| {
        item.as_option_list().is_some_and(|list| {
            names
                .iter()
                .all(|name| list.iter().any(|option| option.name == *name))
        })
    })
}

/// Option lists holding none of `names`. Values that are not option lists pass.
pub fn not_contains_any<'a, R: Filterable>(
    records: &[&'a R],
    property: &str,
    names: &[String],
) -> Vec<&'a R> {
    if names.is_empty() {
        return records.to_vec();
    }
    retain(records, property, |item| match item.as_option_list() {
        Some(list) => !list.iter().any(|option| names.contains(&option.name)),
        None => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{parse_instant, Record, SelectOption};

    fn record(id: &str) -> Record {
        Record::new(id)
            .with("title", PropertyValue::Text(format!("Title {}", id)))
            .with("checkbox", PropertyValue::Bool(false))
            .with("date", PropertyValue::Date(date("2024-01-15")))
            .with("multiSelect", PropertyValue::OptionList(vec![]))
            .with("number", PropertyValue::Number(10.0))
            .with("richText", PropertyValue::Text("test text".into()))
            .with("select", PropertyValue::Null)
    }

    fn date(s: &str) -> DateTime<Utc> {
        parse_instant(s).unwrap()
    }

    fn tags(names: &[&str]) -> PropertyValue {
        PropertyValue::OptionList(names.iter().map(|n| SelectOption::new(*n)).collect())
    }

    fn ids<R: Filterable>(records: &[&R]) -> Vec<String> {
        records.iter().map(|r| r.id().to_string()).collect()
    }

    fn refs(records: &[Record]) -> Vec<&Record> {
        records.iter().collect()
    }

    #[test]
    fn test_equals_number_text_bool() {
        let data = vec![
            record("1").with("number", PropertyValue::Number(10.0)),
            record("2").with("number", PropertyValue::Number(20.0)),
            record("3").with("number", PropertyValue::Number(10.0)),
        ];
        assert_eq!(
            ids(&equals(&refs(&data), "number", &FilterValue::Number(10.0))),
            ["1", "3"]
        );

        let data = vec![
            record("1").with("richText", PropertyValue::Text("hello".into())),
            record("2").with("richText", PropertyValue::Text("world".into())),
        ];
        assert_eq!(
            ids(&equals(&refs(&data), "richText", &FilterValue::Text("hello".into()))),
            ["1"]
        );

        let data = vec![
            record("1").with("checkbox", PropertyValue::Bool(true)),
            record("2"),
            record("3").with("checkbox", PropertyValue::Bool(true)),
        ];
        assert_eq!(
            ids(&equals(&refs(&data), "checkbox", &FilterValue::Bool(true))),
            ["1", "3"]
        );
        assert!(equals(&refs(&data), "number", &FilterValue::Number(99.0)).is_empty());
    }

    #[test]
    fn test_equals_option_by_name() {
        let data = vec![
            record("1").with("select", PropertyValue::Option(SelectOption::new("High"))),
            record("2").with("select", PropertyValue::Option(SelectOption::new("Low"))),
            record("3"),
        ];
        let high = FilterValue::Text("High".into());
        assert_eq!(ids(&equals(&refs(&data), "select", &high)), ["1"]);
        assert_eq!(ids(&not_equals(&refs(&data), "select", &high)), ["2", "3"]);
    }

    #[test]
    fn test_equals_type_mismatch_fails_closed() {
        let data = vec![record("1")];
        assert!(equals(&refs(&data), "number", &FilterValue::Text("10".into())).is_empty());
        assert!(equals(&refs(&data), "multiSelect", &FilterValue::Text("a".into())).is_empty());
        assert_eq!(
            ids(&not_equals(&refs(&data), "number", &FilterValue::Text("10".into()))),
            ["1"]
        );
    }

    #[test]
    fn test_date_equality_modes() {
        let data = vec![
            record("1"),
            record("2").with("date", PropertyValue::Date(date("2024-02-01"))),
        ];
        let day = FilterValue::Date(date("2024-01-15"));

        assert!(equals(&refs(&data), "date", &day).is_empty());
        assert_eq!(ids(&not_equals(&refs(&data), "date", &day)), ["1", "2"]);

        assert_eq!(
            ids(&equals_with(&refs(&data), "date", &day, DateEquality::Instant)),
            ["1"]
        );
        assert_eq!(
            ids(&not_equals_with(&refs(&data), "date", &day, DateEquality::Instant)),
            ["2"]
        );
    }

    #[test]
    fn test_not_equals() {
        let data = vec![
            record("1").with("number", PropertyValue::Number(10.0)),
            record("2").with("number", PropertyValue::Number(20.0)),
            record("3").with("number", PropertyValue::Number(10.0)),
        ];
        assert_eq!(
            ids(&not_equals(&refs(&data), "number", &FilterValue::Number(10.0))),
            ["2"]
        );
        assert_eq!(
            not_equals(&refs(&data), "number", &FilterValue::Number(99.0)).len(),
            3
        );
    }

    #[test]
    fn test_number_ordering() {
        let data = vec![
            record("1").with("number", PropertyValue::Number(10.0)),
            record("2").with("number", PropertyValue::Number(20.0)),
            record("3").with("number", PropertyValue::Number(5.0)),
            record("4").with("number", PropertyValue::Null),
        ];
        let rs = refs(&data);
        assert_eq!(ids(&greater_than(&rs, "number", 10.0)), ["2"]);
        assert_eq!(ids(&less_than(&rs, "number", 10.0)), ["3"]);
        assert_eq!(
            ids(&greater_than_or_equal_to(&rs, "number", 10.0)),
            ["1", "2"]
        );
        assert_eq!(ids(&less_than_or_equal_to(&rs, "number", 10.0)), ["1", "3"]);
        assert!(greater_than(&rs, "number", 20.0).is_empty());
    }

    #[test]
    fn test_number_ordering_excludes_non_numbers() {
        let data = vec![record("1"), record("2")];
        assert!(greater_than(&refs(&data), "richText", 10.0).is_empty());
        assert!(less_than(&refs(&data), "missing", 10.0).is_empty());
    }

    #[test]
    fn test_is_empty_variants() {
        let data = vec![
            record("1").with("select", PropertyValue::Null),
            record("2").with("select", PropertyValue::Option(SelectOption::new("High"))),
        ];
        assert_eq!(ids(&is_empty(&refs(&data), "select")), ["1"]);

        let data = vec![
            record("1").with("richText", PropertyValue::Text(String::new())),
            record("2"),
            record("3").with("richText", PropertyValue::Text(String::new())),
            record("4"),
        ];
        assert_eq!(ids(&is_empty(&refs(&data), "richText")), ["1", "3"]);
        assert_eq!(ids(&is_not_empty(&refs(&data), "richText")), ["2", "4"]);

        let data = vec![record("1"), record("2").with("multiSelect", tags(&["option1"]))];
        assert_eq!(ids(&is_empty(&refs(&data), "multiSelect")), ["1"]);
        assert_eq!(ids(&is_not_empty(&refs(&data), "multiSelect")), ["2"]);
    }

    #[test]
    fn test_absent_property_is_empty() {
        let data = vec![record("1")];
        assert_eq!(ids(&is_empty(&refs(&data), "nope")), ["1"]);
        assert!(is_not_empty(&refs(&data), "nope").is_empty());
    }

    #[test]
    fn test_date_ordering() {
        let data = vec![
            record("1").with("date", PropertyValue::Date(date("2024-01-10"))),
            record("2").with("date", PropertyValue::Date(date("2024-01-20"))),
            record("3").with("date", PropertyValue::Date(date("2024-01-15"))),
        ];
        let rs = refs(&data);
        let pivot = date("2024-01-15");
        assert_eq!(ids(&before(&rs, "date", pivot)), ["1"]);
        assert_eq!(ids(&after(&rs, "date", pivot)), ["2"]);
        assert_eq!(ids(&on_or_before(&rs, "date", pivot)), ["1", "3"]);
        assert_eq!(ids(&on_or_after(&rs, "date", pivot)), ["2", "3"]);
        assert!(before(&rs, "richText", pivot).is_empty());
    }

    #[test]
    fn test_contains_text_and_option_list() {
        let data = vec![
            record("1").with("richText", PropertyValue::Text("hello world".into())),
            record("2").with("richText", PropertyValue::Text("goodbye".into())),
            record("3").with("richText", PropertyValue::Text("say hello".into())),
        ];
        assert_eq!(
            ids(&contains(&refs(&data), "richText", "hello")),
            ["1", "3"]
        );
        assert_eq!(ids(&not_contains(&refs(&data), "richText", "hello")), ["2"]);
        assert!(contains(&refs(&data), "richText", "xyz").is_empty());

        let data = vec![
            record("1").with("multiSelect", tags(&["option1", "option2"])),
            record("2").with("multiSelect", tags(&["option3"])),
        ];
        assert_eq!(
            ids(&contains(&refs(&data), "multiSelect", "option1")),
            ["1"]
        );
        assert_eq!(
            ids(&not_contains(&refs(&data), "multiSelect", "option1")),
            ["2"]
        );
    }

    #[test]
    fn test_contains_polarity_on_other_types() {
        let data = vec![record("1")];
        assert!(contains(&refs(&data), "number", "123").is_empty());
        assert_eq!(ids(&not_contains(&refs(&data), "number", "123")), ["1"]);

        let high = PropertyValue::Option(SelectOption::new("High"));
        let data = vec![record("1").with("select", high)];
        assert!(contains(&refs(&data), "select", "High").is_empty());
        assert_eq!(ids(&not_contains(&refs(&data), "select", "High")), ["1"]);
    }

    #[test]
    fn test_contains_all_requires_every_name() {
        let data = vec![
            record("1").with("multiSelect", tags(&["urgent"])),
            record("2").with("multiSelect", tags(&["vip", "urgent", "later"])),
            record("3").with("multiSelect", tags(&[])),
        ];
        let names = vec!["urgent".to_string(), "vip".to_string()];
        assert_eq!(
            ids(&contains_all(&refs(&data), "multiSelect", &names)),
            ["2"]
        );
        assert_eq!(
            ids(&not_contains_any(&refs(&data), "multiSelect", &names)),
            ["3"]
        );
    }

    #[test]
    fn test_multi_value_edge_cases() {
        let data = vec![record("1"), record("2")];
        assert_eq!(contains_all(&refs(&data), "multiSelect", &[]).len(), 2);
        assert_eq!(not_contains_any(&refs(&data), "multiSelect", &[]).len(), 2);

        let names = vec!["a".to_string()];
        assert!(contains_all(&refs(&data), "richText", &names).is_empty());
        assert_eq!(not_contains_any(&refs(&data), "richText", &names).len(), 2);
    }
}
