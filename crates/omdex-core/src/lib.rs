//! Core runtime for Omdex: schemas, typed values, record conversion, query
//! compilation, and the ergonomics exported via the `prelude`.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod convert;
pub mod error;
pub mod executor;
pub mod query;
pub mod results;
pub mod schema;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Window size used by whole-result-set pagination when the caller asks for
/// a zero-sized page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, executors, or compilation internals are re-exported here.
///

pub mod prelude {
    pub use crate::{
        query::{DistanceUnit, Filter, SearchQuery, SortDirection},
        schema::{FieldKind, FieldSpec, Schema, StorageMode, TextOptions},
        value::{GeoPoint, Timestamp, Value, ValueBag},
    };
}
