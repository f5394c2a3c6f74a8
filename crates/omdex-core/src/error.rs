//! Top-level error type; every subsystem error converts into it.

use crate::{
    convert::ConvertError, executor::ExecuteError, query::QueryError, schema::SchemaError,
};
use thiserror::Error as ThisError;

///
/// Error
///
/// The crate-wide error. Subsystem errors pass through transparently so
/// callers can match on the failure that actually happened.
///

#[remain::sorted]
#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum Error {
    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Execute(#[from] ExecuteError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
