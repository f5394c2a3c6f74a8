//! Filter compilation: resolve logical fields against a schema, enforce
//! kind capabilities, and render the textual query.
//!
//! Validation and rendering are a single pass. A fragment only renders after
//! its condition checks out, so an invalid tree never yields partial output.

use crate::{
    query::{
        escape::{escape_tag, escape_text},
        filter::{Bound, Compare, Condition, Filter},
    },
    schema::{FieldKind, FieldSpec, Schema, SchemaError, StorageMode},
    value::Value,
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// QueryError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum QueryError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("operation '{operation}' is not supported on {kind} field '{field}'")]
    UnsupportedOperation {
        field: String,
        kind: FieldKind,
        operation: String,
    },
}

///
/// SortDirection
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[remain::sorted]
pub enum SortDirection {
    #[display("ASC")]
    Ascending,
    #[display("DESC")]
    Descending,
}

impl SortDirection {
    #[must_use]
    pub const fn as_code(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

///
/// SortBy
///
/// A resolved sort: the engine-facing attribute name plus a direction.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SortBy {
    pub attribute: String,
    pub direction: SortDirection,
}

///
/// Projection
///
/// What the engine should hand back per hit. Inside a [`SearchRequest`] the
/// field list carries engine-facing attribute names.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[remain::sorted]
pub enum Projection {
    #[default]
    All,
    Fields(Vec<String>),
    KeysOnly,
}

///
/// SearchRequest
///
/// Everything an executor needs for one engine round trip. Offsets and
/// counts are explicit; nothing here remembers previous pages.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub index: String,
    pub query: String,
    pub offset: u32,
    pub count: u32,
    pub sort: Option<SortBy>,
    pub projection: Projection,
}

/// Render a whole tree. An empty root renders the match-everything query.
pub(crate) fn render_root(filter: Option<&Filter>, schema: &Schema) -> Result<String, QueryError> {
    match filter {
        None => Ok("*".to_string()),
        Some(f) => render_filter(f, schema),
    }
}

fn render_filter(filter: &Filter, schema: &Schema) -> Result<String, QueryError> {
    match filter {
        Filter::Leaf(condition) => render_condition(condition, schema),
        Filter::And(left, right) => Ok(format!(
            "( {} {} )",
            render_filter(left, schema)?,
            render_filter(right, schema)?
        )),
        Filter::Or(left, right) => Ok(format!(
            "( {} | {} )",
            render_filter(left, schema)?,
            render_filter(right, schema)?
        )),
    }
}

fn render_condition(condition: &Condition, schema: &Schema) -> Result<String, QueryError> {
    let spec = schema.describe(&condition.field)?;
    let fragment = render_compare(&condition.compare, spec, schema.mode())?;
    let negation = if condition.negated { "-" } else { "" };

    Ok(format!(
        "({negation}@{}:{fragment})",
        spec.attribute(schema.mode())
    ))
}

fn render_compare(
    compare: &Compare,
    spec: &FieldSpec,
    mode: StorageMode,
) -> Result<String, QueryError> {
    let unsupported = |operation: String| QueryError::UnsupportedOperation {
        field: spec.name().to_string(),
        kind: spec.kind(),
        operation,
    };

    match compare {
        Compare::Eq(value) => {
            if !spec.kind().supports_eq() {
                return Err(unsupported("eq".to_string()));
            }
            match (spec.kind(), value) {
                (FieldKind::Bool, Value::Bool(b)) => Ok(render_bool_tag(*b, mode).to_string()),
                (FieldKind::Number | FieldKind::Date, _) => {
                    let Some(point) = range_operand(value, spec.kind()) else {
                        return Err(unsupported(format!("eq with a {} operand", value.label())));
                    };
                    Ok(format!("[{point} {point}]"))
                }
                (FieldKind::String, Value::String(s)) => Ok(format!("{{{}}}", escape_tag(s))),
                _ => Err(unsupported(format!("eq with a {} operand", value.label()))),
            }
        }

        Compare::Between { lower, upper } => {
            if !spec.kind().supports_range() {
                return Err(unsupported("range".to_string()));
            }
            let low = match lower {
                Bound::Unbounded => "-inf".to_string(),
                Bound::Inclusive(v) => bound_operand(v, spec, &unsupported)?,
                Bound::Exclusive(v) => format!("({}", bound_operand(v, spec, &unsupported)?),
            };
            let high = match upper {
                Bound::Unbounded => "+inf".to_string(),
                Bound::Inclusive(v) => bound_operand(v, spec, &unsupported)?,
                Bound::Exclusive(v) => format!("({}", bound_operand(v, spec, &unsupported)?),
            };
            Ok(format!("[{low} {high}]"))
        }

        Compare::Matches(s) => {
            if !spec.kind().supports_fulltext() {
                return Err(unsupported("matches".to_string()));
            }
            Ok(format!("'{}'", escape_text(s)))
        }

        Compare::MatchesExactly(s) => {
            if !spec.kind().supports_fulltext() {
                return Err(unsupported("matches_exactly".to_string()));
            }
            Ok(format!("\"{}\"", escape_text(s)))
        }

        Compare::Contains(s) => {
            if !spec.kind().supports_contains() {
                return Err(unsupported("contains".to_string()));
            }
            Ok(format!("{{{}}}", escape_tag(s)))
        }

        Compare::ContainsOneOf(values) => {
            if !spec.kind().supports_contains() {
                return Err(unsupported("contains_one_of".to_string()));
            }
            if values.is_empty() {
                return Err(unsupported("contains_one_of with no values".to_string()));
            }
            let alternatives = values
                .iter()
                .map(|v| escape_tag(v))
                .collect::<Vec<_>>()
                .join("|");
            Ok(format!("{{{alternatives}}}"))
        }

        Compare::InRadius {
            center,
            radius,
            unit,
        } => {
            if !spec.kind().supports_radius() {
                return Err(unsupported("in_radius".to_string()));
            }
            if !radius.is_finite() || *radius < 0.0 {
                return Err(unsupported("in_radius with an invalid radius".to_string()));
            }
            Ok(format!(
                "[{} {} {} {}]",
                center.longitude,
                center.latitude,
                radius,
                unit.as_code()
            ))
        }
    }
}

/// The boolean tag alphabet diverges by mode because the stored tokens do.
const fn render_bool_tag(value: bool, mode: StorageMode) -> &'static str {
    match (mode, value) {
        (StorageMode::Flat, true) => "{1}",
        (StorageMode::Flat, false) => "{0}",
        (StorageMode::Document, true) => "{true}",
        (StorageMode::Document, false) => "{false}",
    }
}

/// Numeric rendering of a range operand. Dates convert to epoch-seconds
/// here, before any text is produced.
fn range_operand(value: &Value, kind: FieldKind) -> Option<String> {
    match (kind, value) {
        (FieldKind::Number, Value::Number(n)) if n.is_finite() => Some(n.to_string()),
        (FieldKind::Date, Value::Date(t)) => Some(t.get().to_string()),
        // A bare number on a date field is taken as epoch-seconds.
        (FieldKind::Date, Value::Number(n)) if n.is_finite() => Some(n.to_string()),
        _ => None,
    }
}

fn bound_operand(
    value: &Value,
    spec: &FieldSpec,
    unsupported: &impl Fn(String) -> QueryError,
) -> Result<String, QueryError> {
    range_operand(value, spec.kind())
        .ok_or_else(|| unsupported(format!("range with a {} operand", value.label())))
}

/// Validate a sort field and resolve it to its engine-facing attribute.
pub(crate) fn resolve_sort(
    schema: &Schema,
    field: &str,
    direction: SortDirection,
) -> Result<SortBy, QueryError> {
    let spec = schema.describe(field)?;

    if !spec.kind().is_sortable() {
        return Err(QueryError::UnsupportedOperation {
            field: spec.name().to_string(),
            kind: spec.kind(),
            operation: "sort_by".to_string(),
        });
    }

    Ok(SortBy {
        attribute: spec.attribute(schema.mode()).to_string(),
        direction,
    })
}

/// Resolve a field-list projection to engine-facing attribute names.
pub(crate) fn resolve_projection(
    schema: &Schema,
    projection: &Projection,
) -> Result<Projection, QueryError> {
    match projection {
        Projection::All => Ok(Projection::All),
        Projection::KeysOnly => Ok(Projection::KeysOnly),
        Projection::Fields(fields) => {
            let mut resolved = Vec::with_capacity(fields.len());
            for name in fields {
                resolved.push(schema.describe(name)?.attribute(schema.mode()).to_string());
            }
            Ok(Projection::Fields(resolved))
        }
    }
}
