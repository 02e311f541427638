//! Error types for loading records, schemas and filters.
//!
//! Evaluation itself never fails; these cover everything around it.

use thiserror::Error;

use crate::filter::ast::Comparator;
use crate::schema::PropertyType;

/// Errors raised while decoding records.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("expected an array of records")]
    NotAnArray,

    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has no string or numeric `id`")]
    MissingId,

    #[error("record {id}: property '{property}' is not {expected}")]
    InvalidProperty {
        id: String,
        property: String,
        expected: &'static str,
    },

    #[error("page {id}: {message}")]
    InvalidPage { id: String, message: String },
}

/// Errors raised when a filter does not fit the schema.
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("unknown property '{0}'")]
    UnknownProperty(String),

    #[error("comparator '{comparator}' is not valid for {property_type} property '{property}'")]
    ComparatorNotAllowed {
        property: String,
        comparator: Comparator,
        property_type: PropertyType,
    },

    #[error("unknown comparator on property '{0}'")]
    UnknownComparator(String),

    #[error("unknown logical operator")]
    UnknownOperator,

    #[error("comparator '{comparator}' on '{property}' requires a value")]
    MissingValue {
        property: String,
        comparator: Comparator,
    },

    #[error("value for '{property}' must be {expected}, got {actual}")]
    ValueTypeMismatch {
        property: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid date '{value}' for '{property}'")]
    InvalidDate { property: String, value: String },
}

/// Errors raised while loading a schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema must be an object with a `properties` map")]
    MissingProperties,

    #[error("unknown property type '{ty}' for '{property}'")]
    UnknownType { property: String, ty: String },
}

/// Top-level error for the library's loading entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Parse(#[from] crate::filter::ParseError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
