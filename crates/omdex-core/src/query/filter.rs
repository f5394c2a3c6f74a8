//! Schema-agnostic filter trees.
//!
//! A [`Filter`] records which comparisons apply to which logical fields and
//! nothing else; it can be built, cloned, and combined with no schema in
//! sight. Field resolution and capability checks happen later, when a tree
//! is rendered against a schema.

use crate::value::{GeoPoint, Value};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr};

///
/// Filter
///
/// Combinators are binary and wrap by construction; combining never mutates
/// an existing subtree, so a built tree can sit on both sides of a branch.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    Leaf(Condition),
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
}

impl Filter {
    /// Conjunction, keeping both operands intact.
    #[must_use]
    pub fn and(self, rhs: Self) -> Self {
        Self::And(Box::new(self), Box::new(rhs))
    }

    /// Disjunction, keeping both operands intact.
    #[must_use]
    pub fn or(self, rhs: Self) -> Self {
        Self::Or(Box::new(self), Box::new(rhs))
    }
}

impl From<Condition> for Filter {
    fn from(condition: Condition) -> Self {
        Self::Leaf(condition)
    }
}

impl BitAnd for Filter {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

impl BitOr for Filter {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

impl BitAnd for &Filter {
    type Output = Filter;

    fn bitand(self, rhs: Self) -> Filter {
        self.clone().and(rhs.clone())
    }
}

impl BitOr for &Filter {
    type Output = Filter;

    fn bitor(self, rhs: Self) -> Filter {
        self.clone().or(rhs.clone())
    }
}

///
/// Condition
///
/// One comparison against one logical field. Negation lives here, on the
/// leaf; the tree has no NOT combinator.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub compare: Compare,
    pub negated: bool,
}

impl Condition {
    #[must_use]
    pub fn new(field: impl Into<String>, compare: Compare) -> Self {
        Self {
            field: field.into(),
            compare,
            negated: false,
        }
    }

    /// Toggle negation. Applying twice restores the original sense.
    #[must_use]
    pub const fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }
}

///
/// Compare
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[remain::sorted]
pub enum Compare {
    /// Ordered range over numbers or dates. Equality on those kinds is the
    /// degenerate single-point range.
    Between { lower: Bound, upper: Bound },
    /// Membership of one element (string-array fields).
    Contains(String),
    /// Membership of any of several elements, rendered as one fragment.
    ContainsOneOf(Vec<String>),
    /// Exact equality (booleans, numbers, dates, plain strings).
    Eq(Value),
    /// Geo radius around a center point.
    InRadius {
        center: GeoPoint,
        radius: f64,
        unit: DistanceUnit,
    },
    /// Full-text word match.
    Matches(String),
    /// Full-text exact-phrase match.
    MatchesExactly(String),
}

///
/// Bound
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[remain::sorted]
pub enum Bound {
    Exclusive(Value),
    Inclusive(Value),
    Unbounded,
}

///
/// DistanceUnit
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[remain::sorted]
pub enum DistanceUnit {
    #[display("ft")]
    Feet,
    #[display("km")]
    Kilometers,
    #[display("m")]
    Meters,
    #[display("mi")]
    Miles,
}

impl DistanceUnit {
    #[must_use]
    pub const fn as_code(self) -> &'static str {
        match self {
            Self::Feet => "ft",
            Self::Kilometers => "km",
            Self::Meters => "m",
            Self::Miles => "mi",
        }
    }
}

/// Exact equality.
#[must_use]
pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    Condition::new(field, Compare::Eq(value.into())).into()
}

/// Exact inequality: equality with the leaf negated.
#[must_use]
pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    Condition::new(field, Compare::Eq(value.into())).negate().into()
}

/// Strictly greater than.
#[must_use]
pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    range(field, Bound::Exclusive(value.into()), Bound::Unbounded)
}

/// Greater than or equal.
#[must_use]
pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    range(field, Bound::Inclusive(value.into()), Bound::Unbounded)
}

/// Strictly less than.
#[must_use]
pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    range(field, Bound::Unbounded, Bound::Exclusive(value.into()))
}

/// Less than or equal.
#[must_use]
pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    range(field, Bound::Unbounded, Bound::Inclusive(value.into()))
}

/// Inclusive range over both ends.
#[must_use]
pub fn between(
    field: impl Into<String>,
    lower: impl Into<Value>,
    upper: impl Into<Value>,
) -> Filter {
    range(field, Bound::Inclusive(lower.into()), Bound::Inclusive(upper.into()))
}

/// Range with explicit bounds.
#[must_use]
pub fn range(field: impl Into<String>, lower: Bound, upper: Bound) -> Filter {
    Condition::new(field, Compare::Between { lower, upper }).into()
}

/// Full-text word match.
#[must_use]
pub fn matches(field: impl Into<String>, value: impl Into<String>) -> Filter {
    Condition::new(field, Compare::Matches(value.into())).into()
}

/// Full-text exact-phrase match.
#[must_use]
pub fn matches_exactly(field: impl Into<String>, value: impl Into<String>) -> Filter {
    Condition::new(field, Compare::MatchesExactly(value.into())).into()
}

/// Array membership of a single element.
#[must_use]
pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Filter {
    Condition::new(field, Compare::Contains(value.into())).into()
}

/// Array membership of any listed element.
#[must_use]
pub fn contains_one_of<I, S>(field: impl Into<String>, values: I) -> Filter
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Condition::new(
        field,
        Compare::ContainsOneOf(values.into_iter().map(Into::into).collect()),
    )
    .into()
}

/// Geo radius around a center point.
#[must_use]
pub fn in_radius(
    field: impl Into<String>,
    center: GeoPoint,
    radius: f64,
    unit: DistanceUnit,
) -> Filter {
    Condition::new(
        field,
        Compare::InRadius {
            center,
            radius,
            unit,
        },
    )
    .into()
}

///
/// TESTS
///
