//! Query construction and compilation.
//!
//! Filters are plain data (`filter`); compilation renders them to engine
//! query text against a schema (`compile`); `SearchQuery` is the fluent
//! front door (`search`). Escaping rules live in `escape`.

pub mod compile;
pub mod escape;
pub mod filter;
pub mod search;

#[cfg(test)]
mod tests;

pub use compile::{Projection, QueryError, SearchRequest, SortBy, SortDirection};
pub use filter::{
    Bound, Compare, Condition, DistanceUnit, Filter, between, contains, contains_one_of, eq, gt,
    gte, in_radius, lt, lte, matches, matches_exactly, ne, range,
};
pub use search::{FieldCondition, SearchQuery};
