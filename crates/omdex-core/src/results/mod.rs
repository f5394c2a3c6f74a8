//! Result materialization: raw engine replies to typed entities.
//!
//! Materialization is all-or-nothing per page. One undecodable row fails the
//! whole call; a silently shorter page would read as missing data.

use crate::{
    convert::{self, FlatRecord},
    error::Error,
    executor::ExecuteError,
    schema::{Schema, StorageMode},
    value::{Value, ValueBag},
};
use serde::{Deserialize, Serialize};

///
/// RawPayload
///
/// Per-hit content as the executor adapter hands it over. Adapters are
/// expected to unwrap client-specific envelopes (a document nested under a
/// root-path marker, say) before building one of these.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[remain::sorted]
pub enum RawPayload {
    /// One JSON object, serialized.
    Document(String),
    /// Flat field/value pairs.
    Fields(Vec<(String, String)>),
    /// No content, key only.
    KeyOnly,
}

impl RawPayload {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Document(_) => "document",
            Self::Fields(_) => "field/value pairs",
            Self::KeyOnly => "key-only",
        }
    }
}

///
/// RawRow
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub key: String,
    pub payload: RawPayload,
}

impl RawRow {
    #[must_use]
    pub fn new(key: impl Into<String>, payload: RawPayload) -> Self {
        Self {
            key: key.into(),
            payload,
        }
    }
}

///
/// RawReply
///
/// One engine reply: the index-wide match total plus this window's rows.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RawReply {
    pub total: u64,
    pub rows: Vec<RawRow>,
}

impl RawReply {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            total: 0,
            rows: Vec::new(),
        }
    }
}

///
/// Entity
///
/// A materialized hit: the bare id (key prefix stripped) plus its decoded
/// values. Plain data; persistence behavior does not live here.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub values: ValueBag,
}

impl Entity {
    #[must_use]
    pub fn new(id: impl Into<String>, values: ValueBag) -> Self {
        Self {
            id: id.into(),
            values,
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }
}

///
/// SearchPage
///
/// One window of results plus the index-wide total, so callers can tell
/// "this page is short" from "that was everything".
///

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub total: u64,
    pub entities: Vec<Entity>,
}

impl SearchPage {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Entity> {
        self.entities.first()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }
}

impl IntoIterator for SearchPage {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}

impl<'a> IntoIterator for &'a SearchPage {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Decode a full reply into typed entities.
pub(crate) fn materialize(reply: RawReply, schema: &Schema) -> Result<SearchPage, Error> {
    let mut entities = Vec::with_capacity(reply.rows.len());
    for row in reply.rows {
        entities.push(materialize_row(row, schema)?);
    }

    Ok(SearchPage {
        total: reply.total,
        entities,
    })
}

/// Extract ids only, for keys-only replies.
pub(crate) fn materialize_ids(reply: &RawReply, schema: &Schema) -> Result<(u64, Vec<String>), Error> {
    let mut ids = Vec::with_capacity(reply.rows.len());
    for row in &reply.rows {
        ids.push(entity_id(schema, &row.key)?);
    }

    Ok((reply.total, ids))
}

fn materialize_row(row: RawRow, schema: &Schema) -> Result<Entity, Error> {
    let id = entity_id(schema, &row.key)?;

    let values = match (schema.mode(), row.payload) {
        (StorageMode::Flat, RawPayload::Fields(pairs)) => {
            let record: FlatRecord = pairs.into_iter().collect();
            convert::from_record(&record, schema)?
        }
        (StorageMode::Document, RawPayload::Document(json)) => {
            let doc: convert::Document = serde_json::from_str(&json).map_err(|e| {
                ExecuteError::malformed(format!(
                    "document payload for key '{id}' is not a JSON object: {e}"
                ))
            })?;
            convert::from_document(&doc, schema)?
        }
        (mode, payload) => {
            return Err(ExecuteError::malformed(format!(
                "{} payload does not match {mode} storage for key '{id}'",
                payload.label()
            ))
            .into());
        }
    };

    Ok(Entity { id, values })
}

fn entity_id(schema: &Schema, key: &str) -> Result<String, Error> {
    schema
        .entity_id(key)
        .map(String::from)
        .ok_or_else(|| {
            ExecuteError::malformed(format!(
                "key '{key}' does not carry prefix '{}'",
                schema.key_prefix()
            ))
            .into()
        })
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::people_schema;

    fn fields(pairs: &[(&str, &str)]) -> RawPayload {
        RawPayload::Fields(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn materializes_flat_rows() {
        let schema = people_schema(StorageMode::Flat);
        let reply = RawReply {
            total: 7,
            rows: vec![
                RawRow::new("person:1", fields(&[("age", "30"), ("active", "1")])),
                RawRow::new("person:2", fields(&[("age", "41")])),
            ],
        };

        let page = materialize(reply, &schema).unwrap();

        assert_eq!(page.total, 7);
        assert_eq!(page.len(), 2);
        assert_eq!(page.ids(), vec!["1", "2"]);
        assert_eq!(page.entities[0].get("age"), Some(&Value::Number(30.0)));
        assert_eq!(page.entities[0].get("active"), Some(&Value::Bool(true)));
        assert_eq!(page.entities[1].get("active"), None);

        let ages: Vec<_> = page.iter().filter_map(|e| e.get("age")).collect();
        assert_eq!(ages, vec![&Value::Number(30.0), &Value::Number(41.0)]);
    }

    #[test]
    fn materializes_document_rows() {
        let schema = people_schema(StorageMode::Document);
        let reply = RawReply {
            total: 1,
            rows: vec![RawRow::new(
                "person:9",
                RawPayload::Document(r#"{"age": 30.0, "profile": {"years": 5.0}}"#.to_string()),
            )],
        };

        let page = materialize(reply, &schema).unwrap();

        assert_eq!(page.entities[0].id, "9");
        assert_eq!(page.entities[0].get("age"), Some(&Value::Number(30.0)));
        assert_eq!(page.entities[0].get("years"), Some(&Value::Number(5.0)));
    }

    #[test]
    fn one_bad_row_fails_the_page() {
        let schema = people_schema(StorageMode::Flat);
        let reply = RawReply {
            total: 2,
            rows: vec![
                RawRow::new("person:1", fields(&[("age", "30")])),
                RawRow::new("person:2", fields(&[("age", "not-a-number")])),
            ],
        };

        assert!(matches!(
            materialize(reply, &schema).unwrap_err(),
            Error::Convert(_)
        ));
    }

    #[test]
    fn foreign_key_prefix_is_malformed() {
        let schema = people_schema(StorageMode::Flat);
        let reply = RawReply {
            total: 1,
            rows: vec![RawRow::new("invoice:1", fields(&[]))],
        };

        assert!(matches!(
            materialize(reply, &schema).unwrap_err(),
            Error::Execute(ExecuteError::MalformedReply { .. })
        ));
    }

    #[test]
    fn payload_mode_mismatch_is_malformed() {
        let schema = people_schema(StorageMode::Flat);
        let reply = RawReply {
            total: 1,
            rows: vec![RawRow::new(
                "person:1",
                RawPayload::Document("{}".to_string()),
            )],
        };

        assert!(matches!(
            materialize(reply, &schema).unwrap_err(),
            Error::Execute(ExecuteError::MalformedReply { .. })
        ));
    }

    #[test]
    fn broken_document_payload_is_malformed() {
        let schema = people_schema(StorageMode::Document);
        let reply = RawReply {
            total: 1,
            rows: vec![RawRow::new(
                "person:1",
                RawPayload::Document("not json".to_string()),
            )],
        };

        assert!(matches!(
            materialize(reply, &schema).unwrap_err(),
            Error::Execute(ExecuteError::MalformedReply { .. })
        ));
    }

    #[test]
    fn ids_from_key_only_rows() {
        let schema = people_schema(StorageMode::Flat);
        let reply = RawReply {
            total: 3,
            rows: vec![
                RawRow::new("person:a", RawPayload::KeyOnly),
                RawRow::new("person:b", RawPayload::KeyOnly),
            ],
        };

        let (total, ids) = materialize_ids(&reply, &schema).unwrap();
        assert_eq!(total, 3);
        assert_eq!(ids, vec!["a", "b"]);
    }
}
