pub mod bag;
pub mod point;
pub mod timestamp;

pub use bag::ValueBag;
pub use point::GeoPoint;
pub use timestamp::Timestamp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

///
/// Value
///
/// The dynamic payload an entity field can hold. Variants align one-to-one
/// with the declarable field kinds, except that string and full-text fields
/// share `String`.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[remain::sorted]
pub enum Value {
    Bool(bool),
    Date(Timestamp),
    Number(f64),
    Point(GeoPoint),
    String(String),
    StringArray(Vec<String>),
}

impl Value {
    /// Short label for diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Date(_) => "date",
            Self::Number(_) => "number",
            Self::Point(_) => "point",
            Self::String(_) => "string",
            Self::StringArray(_) => "string array",
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<Timestamp> {
        match self {
            Self::Date(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_point(&self) -> Option<GeoPoint> {
        match self {
            Self::Point(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_string_array(&self) -> Option<&[String]> {
        match self {
            Self::StringArray(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Self::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Date(Timestamp::from(v))
    }
}

impl From<GeoPoint> for Value {
    fn from(v: GeoPoint) -> Self {
        Self::Point(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Self::StringArray(v)
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Self::StringArray(v.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Value {
    fn from(v: &[&str]) -> Self {
        Self::StringArray(v.iter().map(|s| (*s).to_string()).collect())
    }
}

///
/// TESTS
///
