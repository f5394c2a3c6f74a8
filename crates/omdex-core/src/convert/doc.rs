//! Document-mode conversion: one nested JSON object per entity.
//!
//! Native JSON types carry most kinds directly; points stay in their
//! `"lon,lat"` string form because geo indexes read them that way. Dot-paths
//! in field locations become real nesting here.

use crate::{
    convert::ConvertError,
    schema::{FieldKind, FieldSpec, Schema},
    value::{GeoPoint, Timestamp, Value, ValueBag},
};
use serde_json::Value as Json;

/// Stored shape of one document-mode entity.
pub type Document = serde_json::Map<String, Json>;

/// Encode a bag into a nested document. Fields absent from the bag are
/// absent from the document; bag entries with no declaration fail loudly.
pub fn to_document(bag: &ValueBag, schema: &Schema) -> Result<Document, ConvertError> {
    let mut doc = Document::new();

    for spec in schema.fields() {
        if let Some(value) = bag.get(spec.name()) {
            let encoded = encode(spec, value)?;
            insert_at(&mut doc, spec, encoded)?;
        }
    }

    for (name, _) in bag.iter() {
        schema.describe(name)?;
    }

    Ok(doc)
}

/// Decode a stored document back into a bag. A JSON `null` is treated the
/// same as an absent path; document entries outside the schema are ignored.
pub fn from_document(doc: &Document, schema: &Schema) -> Result<ValueBag, ConvertError> {
    let mut bag = ValueBag::new();

    for spec in schema.fields() {
        if let Some(json) = lookup(doc, spec.location()) {
            if json.is_null() {
                continue;
            }
            bag.set(spec.name(), decode(spec, json)?);
        }
    }

    Ok(bag)
}

fn encode(spec: &FieldSpec, value: &Value) -> Result<Json, ConvertError> {
    let mismatch = |actual: String| ConvertError::TypeMismatch {
        field: spec.name().to_string(),
        expected: spec.kind(),
        actual,
    };

    match (spec.kind(), value) {
        (FieldKind::Bool, Value::Bool(b)) => Ok(Json::Bool(*b)),
        (FieldKind::Number, Value::Number(n)) => serde_json::Number::from_f64(*n)
            .map(Json::Number)
            .ok_or_else(|| mismatch("a non-finite number".to_string())),
        (FieldKind::Date, Value::Date(t)) => Ok(Json::Number(t.get().into())),
        (FieldKind::String | FieldKind::Text, Value::String(s)) => Ok(Json::String(s.clone())),
        (FieldKind::StringArray, Value::StringArray(items)) => Ok(Json::Array(
            items.iter().cloned().map(Json::String).collect(),
        )),
        (FieldKind::Point, Value::Point(p)) => {
            if p.in_bounds() {
                Ok(Json::String(p.to_string()))
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

fn decode(spec: &FieldSpec, json: &Json) -> Result<Value, ConvertError> {
    let unparsable = || ConvertError::Value {
        field: spec.name().to_string(),
        expected: spec.kind(),
        raw: json.to_string(),
    };

    match (spec.kind(), json) {
        (FieldKind::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
        (FieldKind::Number, Json::Number(n)) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .map(Value::Number)
            .ok_or_else(unparsable),
        (FieldKind::Date, Json::Number(n)) => {
            // Whole seconds only; a fractional stored date is drift, not
            // something to floor away quietly.
            if let Some(secs) = n.as_i64() {
                Ok(Value::Date(Timestamp::from_seconds(secs)))
            } else {
                Err(unparsable())
            }
        }
        (FieldKind::String | FieldKind::Text, Json::String(s)) => Ok(Value::String(s.clone())),
        (FieldKind::StringArray, Json::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(String::from).ok_or_else(&unparsable))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::StringArray),
        (FieldKind::Point, Json::String(s)) => {
            let p = GeoPoint::parse(s).map_err(|_| unparsable())?;
            if p.in_bounds() {
                Ok(Value::Point(p))
            } else {
                Err(ConvertError::PointOutOfRange {
                    longitude: p.longitude,
                    latitude: p.latitude,
                })
            }
        }
        _ => Err(unparsable()),
    }
}

/// Write a value at the field's dot-path, creating intermediate objects.
/// Schema validation already ruled out path collisions, so a non-object in
/// the way means the document itself is inconsistent.
fn insert_at(doc: &mut Document, spec: &FieldSpec, value: Json) -> Result<(), ConvertError> {
    let path = spec.location();
    let mut cursor = doc;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            cursor.insert(segment.to_string(), value);
            return Ok(());
        }

        let slot = cursor
            .entry(segment.to_string())
            .or_insert_with(|| Json::Object(Document::new()));
        match slot {
            Json::Object(map) => cursor = map,
            _ => {
                return Err(ConvertError::TypeMismatch {
                    field: spec.name().to_string(),
                    expected: spec.kind(),
                    actual: format!("a non-object at path segment '{segment}'"),
                });
            }
        }
    }

    Ok(())
}

/// Resolve a dot-path against a document. `None` when any segment is absent
/// or the walk hits a non-object.
fn lookup<'d>(doc: &'d Document, path: &str) -> Option<&'d Json> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;

    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }

    Some(current)
}

///
/// TESTS
///
