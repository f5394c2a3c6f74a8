//! Schema registry: field declarations validated once at construction.
//!
//! Everything downstream (conversion, query compilation, materialization)
//! trusts a built [`Schema`] and never re-validates declarations.

pub mod field;


pub use field::{FieldKind, FieldSpec, PhoneticMatcher, TextOptions};

use crate::query::search::SearchQuery;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// StorageMode
///
/// How entity records physically land in the store: flat field/value pairs
/// or one nested JSON document per entity.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[remain::sorted]
pub enum StorageMode {
    #[display("document")]
    Document,
    #[display("flat")]
    Flat,
}

///
/// SchemaError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum SchemaError {
    #[error("schema '{schema}' declares field '{field}' more than once")]
    DuplicateField { schema: String, field: String },

    #[error("schema '{schema}' has no field named '{field}'")]
    FieldNotFound { schema: String, field: String },

    #[error("field '{field}' declares an invalid storage location: {reason}")]
    InvalidFieldLocation { field: String, reason: String },

    #[error("field '{field}' declares unknown type '{type_name}'")]
    InvalidFieldType { field: String, type_name: String },

    #[error("field '{field}' declares an unusable separator")]
    InvalidSeparator { field: String },
}

///
/// Schema
///
/// An immutable, validated set of field declarations for one entity kind,
/// plus the key prefix and index name derived from the entity name.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    name: String,
    mode: StorageMode,
    key_prefix: String,
    index_name: String,
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Start declaring a schema for the named entity kind.
    #[must_use]
    pub fn build(name: impl Into<String>, mode: StorageMode) -> SchemaBuilder {
        SchemaBuilder::new(name, mode)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn mode(&self) -> StorageMode {
        self.mode
    }

    /// Prefix prepended to entity ids to form storage keys.
    #[must_use]
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Name of the search index covering this schema's records.
    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Declarations in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Like [`Self::field`], but an unknown name is an error. Query and
    /// conversion paths use this so undeclared fields always surface.
    pub fn describe(&self, name: &str) -> Result<&FieldSpec, SchemaError> {
        self.field(name).ok_or_else(|| SchemaError::FieldNotFound {
            schema: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// Search-declaration path for one field, mode-dependent.
    pub fn search_location(&self, name: &str) -> Result<String, SchemaError> {
        Ok(self.describe(name)?.search_location(self.mode))
    }

    /// Storage key for an entity id.
    #[must_use]
    pub fn entity_key(&self, id: &str) -> String {
        format!("{}{id}", self.key_prefix)
    }

    /// Recover the entity id from a storage key, if the key carries this
    /// schema's prefix.
    #[must_use]
    pub fn entity_id<'k>(&self, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(self.key_prefix.as_str())
    }

    /// Begin a fluent search over this schema.
    #[must_use]
    pub fn search(&self) -> SearchQuery<'_> {
        SearchQuery::new(self)
    }
}

///
/// SchemaBuilder
///
/// Collects declarations, then validates the whole set in `build`. Nothing
/// is checked until then, so declaration order never matters.
///

#[derive(Clone, Debug)]
pub struct SchemaBuilder {
    name: String,
    mode: StorageMode,
    key_prefix: Option<String>,
    index_name: Option<String>,
    fields: Vec<PendingField>,
}

#[derive(Clone, Debug)]
enum PendingField {
    Resolved(FieldSpec),
    Labeled { name: String, type_label: String },
}

impl SchemaBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>, mode: StorageMode) -> Self {
        Self {
            name: name.into(),
            mode,
            key_prefix: None,
            index_name: None,
            fields: Vec::new(),
        }
    }

    /// Add a fully-typed field declaration.
    #[must_use]
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(PendingField::Resolved(spec));
        self
    }

    /// Add a declaration by type label, as config-driven callers do. The
    /// label is resolved during `build`, where an unknown label fails.
    #[must_use]
    pub fn declare(mut self, name: impl Into<String>, type_label: impl Into<String>) -> Self {
        self.fields.push(PendingField::Labeled {
            name: name.into(),
            type_label: type_label.into(),
        });
        self
    }

    /// Override the derived `<name>:` key prefix.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Override the derived `<name>:index` index name.
    #[must_use]
    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut fields = Vec::with_capacity(self.fields.len());
        for pending in self.fields {
            fields.push(match pending {
                PendingField::Resolved(spec) => spec,
                PendingField::Labeled { name, type_label } => {
                    let Some(kind) = FieldKind::parse(&type_label) else {
                        return Err(SchemaError::InvalidFieldType {
                            field: name,
                            type_name: type_label,
                        });
                    };
                    FieldSpec::new(name, kind)
                }
            });
        }

        for (i, spec) in fields.iter().enumerate() {
            Self::check_location(self.mode, spec)?;

            // Exactly one character, and not the array escape character.
            // Longer separators cannot be escaped unambiguously at element
            // boundaries.
            if spec.separator().chars().count() != 1 || spec.separator() == "\\" {
                return Err(SchemaError::InvalidSeparator {
                    field: spec.name().to_string(),
                });
            }

            for other in &fields[..i] {
                if other.name() == spec.name() {
                    return Err(SchemaError::DuplicateField {
                        schema: self.name.clone(),
                        field: spec.name().to_string(),
                    });
                }
                Self::check_collision(self.mode, spec, other)?;
            }
        }

        let key_prefix = self.key_prefix.unwrap_or_else(|| format!("{}:", self.name));
        let index_name = self
            .index_name
            .unwrap_or_else(|| format!("{}:index", self.name));

        Ok(Schema {
            name: self.name,
            mode: self.mode,
            key_prefix,
            index_name,
            fields,
        })
    }

    fn check_location(mode: StorageMode, spec: &FieldSpec) -> Result<(), SchemaError> {
        let invalid = |reason: &str| SchemaError::InvalidFieldLocation {
            field: spec.name().to_string(),
            reason: reason.to_string(),
        };

        if spec.has_explicit_location() && spec.location().is_empty() {
            return Err(invalid("location is empty"));
        }
        if spec.location().starts_with('$') {
            return Err(invalid("the json-path prefix is implicit, declare a bare path"));
        }
        if mode == StorageMode::Document && spec.location().split('.').any(str::is_empty) {
            return Err(invalid("path contains an empty segment"));
        }

        Ok(())
    }

    /// Two fields may not share a storage location, and in document mode one
    /// field's path may not nest under another's.
    fn check_collision(
        mode: StorageMode,
        spec: &FieldSpec,
        other: &FieldSpec,
    ) -> Result<(), SchemaError> {
        let invalid = |field: &FieldSpec, reason: String| SchemaError::InvalidFieldLocation {
            field: field.name().to_string(),
            reason,
        };

        if spec.location() == other.location() {
            return Err(invalid(
                spec,
                format!("location collides with field '{}'", other.name()),
            ));
        }

        if mode == StorageMode::Document {
            let nests = |inner: &FieldSpec, outer: &FieldSpec| {
                inner
                    .location()
                    .strip_prefix(outer.location())
                    .is_some_and(|rest| rest.starts_with('.'))
            };
            if nests(spec, other) {
                return Err(invalid(
                    spec,
                    format!("path nests under field '{}'", other.name()),
                ));
            }
            if nests(other, spec) {
                return Err(invalid(
                    other,
                    format!("path nests under field '{}'", spec.name()),
                ));
            }
        }

        Ok(())
    }
}
