//! Record conversion: typed value bags to and from stored shapes.
//!
//! Flat mode speaks field/value string pairs; document mode speaks one JSON
//! object per entity. Decoding is strict: a stored value that does not parse
//! for its declared kind fails the whole conversion, nothing coerces.

pub mod doc;
pub mod flat;


pub use doc::{Document, from_document, to_document};
pub use flat::{FlatRecord, from_record, to_record};

use crate::schema::{FieldKind, SchemaError};
use thiserror::Error as ThisError;

///
/// ConvertError
///

#[derive(Clone, Debug, PartialEq, ThisError)]
#[remain::sorted]
pub enum ConvertError {
    #[error("geo point out of range: longitude {longitude}, latitude {latitude}")]
    PointOutOfRange { longitude: f64, latitude: f64 },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("field '{field}' expected a {expected} value, got {actual}")]
    TypeMismatch {
        field: String,
        expected: FieldKind,
        actual: String,
    },

    #[error("field '{field}' holds a stored value that does not parse as {expected}: {raw}")]
    Value {
        field: String,
        expected: FieldKind,
        raw: String,
    },
}
