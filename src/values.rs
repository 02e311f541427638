use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::record::{Filterable, PropertyValue};

/// One distinct value of a property and how many records carry it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueCount {
    pub value: PropertyValue,
    pub count: usize,
}

impl ValueCount {
    pub fn label(&self) -> String {
        match &self.value {
            PropertyValue::Text(s) => s.clone(),
            PropertyValue::Number(n) => n.to_string(),
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Date(d) => d.to_rfc3339(),
            PropertyValue::Option(option) => option.name.clone(),
            PropertyValue::Null | PropertyValue::OptionList(_) => String::new(),
        }
    }
}

/// Counts the distinct values of `property` in first-seen order. Option
/// lists count each element; options are keyed by name; empty values are
/// skipped.
pub fn collect_values<R: Filterable>(records: &[R], property: &str) -> Vec<ValueCount> {
    let mut counts: IndexMap<String, ValueCount> = IndexMap::new();

    for record in records {
        match record.value(property) {
            PropertyValue::OptionList(options) => {
                for option in options {
                    tally(&mut counts, PropertyValue::Option(option.clone()));
                }
            }
            value => tally(&mut counts, value.clone()),
        }
    }

    counts.into_values().collect()
}

fn tally(counts: &mut IndexMap<String, ValueCount>, value: PropertyValue) {
    let entry = ValueCount { value, count: 0 };
    let label = entry.label();
    if label.is_empty() {
        return;
    }
    counts.entry(label).or_insert(entry).count += 1;
}

// Numbers and dates order by magnitude, everything else by label. Mixed
// kinds group by kind.
fn compare_values(a: &ValueCount, b: &ValueCount) -> Ordering {
    match (&a.value, &b.value) {
        (PropertyValue::Number(x), PropertyValue::Number(y)) => x.total_cmp(y),
        (PropertyValue::Date(x), PropertyValue::Date(y)) => x.cmp(y),
        (PropertyValue::Bool(x), PropertyValue::Bool(y)) => x.cmp(y),
        (x, y) => kind_rank(x)
            .cmp(&kind_rank(y))
            .then_with(|| a.label().cmp(&b.label())),
    }
}

fn kind_rank(value: &PropertyValue) -> u8 {
    match value {
        PropertyValue::Bool(_) => 0,
        PropertyValue::Number(_) => 1,
        PropertyValue::Date(_) => 2,
        PropertyValue::Text(_) | PropertyValue::Option(_) => 3,
        PropertyValue::Null | PropertyValue::OptionList(_) => 4,
    }
}

/// Sorts by value, or by count descending with `value: count` lines.
pub fn format_values(mut values: Vec<ValueCount>, show_count: bool) -> Vec<String> {
    if show_count {
        values.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| compare_values(a, b)));
        values
            .iter()
            .map(|v| format!("{}: {}", v.label(), v.count))
            .collect()
    } else {
        values.sort_by(compare_values);
        values.iter().map(ValueCount::label).collect()
    }
}
