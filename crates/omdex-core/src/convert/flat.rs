//! Flat-mode conversion: one string per field, keyed by storage location.
//!
//! Stringification rules are fixed: booleans become `"1"`/`"0"`, dates become
//! whole epoch-seconds, arrays join on the field's separator with embedded
//! separators backslash-escaped, points become `"lon,lat"`.

use crate::{
    convert::ConvertError,
    schema::{FieldKind, FieldSpec, Schema},
    value::{GeoPoint, Timestamp, Value, ValueBag},
};
use std::collections::BTreeMap;

/// Stored shape of one flat-mode entity.
pub type FlatRecord = BTreeMap<String, String>;

/// Encode a bag into field/value pairs. Fields absent from the bag are
/// absent from the record; bag entries with no declaration fail loudly.
pub fn to_record(bag: &ValueBag, schema: &Schema) -> Result<FlatRecord, ConvertError> {
    let mut record = FlatRecord::new();

    for spec in schema.fields() {
        if let Some(value) = bag.get(spec.name()) {
            record.insert(spec.location().to_string(), encode(spec, value)?);
        }
    }

    for (name, _) in bag.iter() {
        schema.describe(name)?;
    }

    Ok(record)
}

/// Decode stored pairs back into a bag. Record entries outside the schema
/// are ignored; the store may hold fields that are not ours.
pub fn from_record(record: &FlatRecord, schema: &Schema) -> Result<ValueBag, ConvertError> {
    let mut bag = ValueBag::new();

    for spec in schema.fields() {
        if let Some(raw) = record.get(spec.location()) {
            bag.set(spec.name(), decode(spec, raw)?);
        }
    }

    Ok(bag)
}

fn encode(spec: &FieldSpec, value: &Value) -> Result<String, ConvertError> {
    let mismatch = |actual: String| ConvertError::TypeMismatch {
        field: spec.name().to_string(),
        expected: spec.kind(),
        actual,
    };

    match (spec.kind(), value) {
        (FieldKind::Bool, Value::Bool(b)) => Ok(if *b { "1" } else { "0" }.to_string()),
        (FieldKind::Number, Value::Number(n)) => {
            if n.is_finite() {
                Ok(n.to_string())
            } else {
                Err(mismatch("a non-finite number".to_string()))
            }
        }
        (FieldKind::Date, Value::Date(t)) => Ok(t.get().to_string()),
        (FieldKind::String | FieldKind::Text, Value::String(s)) => Ok(s.clone()),
        (FieldKind::StringArray, Value::StringArray(items)) => {
            Ok(join_elements(items, spec.separator()))
        }
        (FieldKind::Point, Value::Point(p)) => {
            if p.in_bounds() {
                Ok(p.to_string())
            } else {
                Err(ConvertError::PointOutOfRange {
                    longitude: p.longitude,
                    latitude: p.latitude,
                })
            }
        }
        (_, other) => Err(mismatch(other.label().to_string())),
    }
}

fn decode(spec: &FieldSpec, raw: &str) -> Result<Value, ConvertError> {
    let unparsable = || ConvertError::Value {
        field: spec.name().to_string(),
        expected: spec.kind(),
        raw: raw.to_string(),
    };

    match spec.kind() {
        FieldKind::Bool => match raw {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            _ => Err(unparsable()),
        },
        FieldKind::Number => raw
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Number)
            .ok_or_else(unparsable),
        FieldKind::Date => raw
            .parse::<i64>()
            .map(|secs| Value::Date(Timestamp::from_seconds(secs)))
            .map_err(|_| unparsable()),
        FieldKind::String | FieldKind::Text => Ok(Value::String(raw.to_string())),
        FieldKind::StringArray => Ok(Value::StringArray(split_elements(raw, spec.separator()))),
        FieldKind::Point => {
            let p = GeoPoint::parse(raw).map_err(|_| unparsable())?;
            if p.in_bounds() {
                Ok(Value::Point(p))
            } else {
                Err(ConvertError::PointOutOfRange {
                    longitude: p.longitude,
                    latitude: p.latitude,
                })
            }
        }
    }
}

/// Join array elements on the separator, backslash-escaping the escape
/// character and any embedded separator so every element survives the
/// round trip.
fn join_elements(items: &[String], separator: &str) -> String {
    let escaped = format!("\\{separator}");
    items
        .iter()
        .map(|item| item.replace('\\', "\\\\").replace(separator, &escaped))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Inverse of [`join_elements`]. An empty string is the empty array; there
/// is no flat encoding that distinguishes `[]` from `[""]`.
fn split_elements(raw: &str, separator: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut rest = raw;

    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix('\\') {
            match tail.chars().next() {
                Some(c) => {
                    current.push(c);
                    rest = &tail[c.len_utf8()..];
                }
                None => {
                    // Trailing escape with nothing to escape, keep it literal.
                    current.push('\\');
                    rest = tail;
                }
            }
        } else if let Some(tail) = rest.strip_prefix(separator) {
            items.push(std::mem::take(&mut current));
            rest = tail;
        } else {
            match rest.chars().next() {
                Some(c) => {
                    current.push(c);
                    rest = &rest[c.len_utf8()..];
                }
                None => break,
            }
        }
    }

    items.push(current);
    items
}

///
/// TESTS
///
