//! Filter a table of typed records with nested AND/OR filter expressions.
//!
//! Records carry text, boolean, number, date, option and option-list
//! properties. A [`FilterExpr`] is either a condition (property, comparator,
//! value) or a group combining child expressions with AND or OR:
//!
//! ```rust
//! use rowq::{evaluate, Comparator, FilterExpr, FilterValue, PropertyValue, Record};
//!
//! let records = vec![
//!     Record::new("1").with("number", PropertyValue::Number(10.0)),
//!     Record::new("2").with("number", PropertyValue::Number(20.0)),
//! ];
//!
//! let expr = FilterExpr::or(vec![
//!     FilterExpr::condition("number", Comparator::GreaterThan, FilterValue::Number(15.0)),
//!     FilterExpr::condition("number", Comparator::Equals, FilterValue::Number(10.0)),
//! ]);
//!
//! let ids: Vec<_> = evaluate(&records, &expr)
//!     .iter()
//!     .map(|r| r.id.to_string())
//!     .collect();
//! assert_eq!(ids, ["2", "1"]);
//! ```
//!
//! AND narrows: each child filters what the previous child kept. OR runs
//! every child over the full input and keeps each record once, in order of
//! first appearance. Evaluation never fails: a value of the wrong shape just
//! does not match, an unknown comparator passes everything through, and an
//! unknown logical operator matches nothing.

pub mod error;
pub mod filter;
pub mod notion;
pub mod record;
pub mod schema;
pub mod source;
pub mod values;

pub use error::{Error, FilterError, RecordError, Result, SchemaError};
pub use filter::{
    evaluate, evaluate_refs, evaluate_with, parse, Comparator, Condition, DateEquality, EvalOptions,
    FilterExpr, FilterValue, Group, LogicalOperator, ParseError,
};
pub use record::{Color, Filterable, PropertyValue, Record, RecordId, SelectOption};
pub use schema::{PropertyType, Schema};
