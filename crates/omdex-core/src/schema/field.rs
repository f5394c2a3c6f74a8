use crate::{
    schema::StorageMode,
    value::Value,
};
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// FieldKind
///
/// The closed set of declarable field types. Capability predicates below are
/// the single source of truth for which comparisons a kind admits; query
/// validation and conversion both dispatch on them.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[remain::sorted]
pub enum FieldKind {
    #[display("boolean")]
    #[serde(rename = "boolean")]
    Bool,
    #[display("date")]
    Date,
    #[display("number")]
    Number,
    #[display("point")]
    Point,
    #[display("string")]
    String,
    #[display("string-array")]
    StringArray,
    #[display("text")]
    Text,
}

impl FieldKind {
    /// Resolve a declaration label. `None` for anything outside the closed set.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "boolean" => Some(Self::Bool),
            "date" => Some(Self::Date),
            "number" => Some(Self::Number),
            "point" => Some(Self::Point),
            "string" => Some(Self::String),
            "string-array" => Some(Self::StringArray),
            "text" => Some(Self::Text),
            _ => None,
        }
    }

    /// Exact-match equality. Full-text fields are deliberately excluded;
    /// they answer to `matches`, not `eq`.
    #[must_use]
    pub const fn supports_eq(self) -> bool {
        matches!(self, Self::Bool | Self::Date | Self::Number | Self::String)
    }

    /// Ordered comparisons and between-ranges.
    #[must_use]
    pub const fn supports_range(self) -> bool {
        matches!(self, Self::Date | Self::Number)
    }

    /// Word and exact-phrase matching.
    #[must_use]
    pub const fn supports_fulltext(self) -> bool {
        matches!(self, Self::Text)
    }

    /// Membership tests.
    #[must_use]
    pub const fn supports_contains(self) -> bool {
        matches!(self, Self::StringArray)
    }

    /// Geo radius searches.
    #[must_use]
    pub const fn supports_radius(self) -> bool {
        matches!(self, Self::Point)
    }

    /// Sortability is structural: multi-valued and geo kinds never sort,
    /// no matter what a declaration asks for.
    #[must_use]
    pub const fn is_sortable(self) -> bool {
        !matches!(self, Self::Point | Self::StringArray)
    }

    /// Whether a runtime value is admissible for this kind.
    #[must_use]
    pub const fn matches_value(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Bool, Value::Bool(_))
                | (Self::Date, Value::Date(_))
                | (Self::Number, Value::Number(_))
                | (Self::Point, Value::Point(_))
                | (Self::String | Self::Text, Value::String(_))
                | (Self::StringArray, Value::StringArray(_))
        )
    }
}

///
/// PhoneticMatcher
///
/// Double-metaphone variants the index side understands.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[remain::sorted]
pub enum PhoneticMatcher {
    #[display("dm:en")]
    #[serde(rename = "dm:en")]
    DmEnglish,
    #[display("dm:fr")]
    #[serde(rename = "dm:fr")]
    DmFrench,
    #[display("dm:pt")]
    #[serde(rename = "dm:pt")]
    DmPortuguese,
    #[display("dm:es")]
    #[serde(rename = "dm:es")]
    DmSpanish,
}

impl PhoneticMatcher {
    #[must_use]
    pub const fn as_code(self) -> &'static str {
        match self {
            Self::DmEnglish => "dm:en",
            Self::DmFrench => "dm:fr",
            Self::DmPortuguese => "dm:pt",
            Self::DmSpanish => "dm:es",
        }
    }
}

///
/// TextOptions
///
/// Tuning knobs that only make sense on full-text fields.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextOptions {
    #[serde(default = "default_stemming")]
    pub stemming: bool,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub phonetic: Option<PhoneticMatcher>,
}

impl TextOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stemming: true,
            weight: 1.0,
            phonetic: None,
        }
    }

    #[must_use]
    pub const fn no_stemming(mut self) -> Self {
        self.stemming = false;
        self
    }

    #[must_use]
    pub const fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    #[must_use]
    pub const fn phonetic(mut self, matcher: PhoneticMatcher) -> Self {
        self.phonetic = Some(matcher);
        self
    }
}

impl Default for TextOptions {
    fn default() -> Self {
        Self::new()
    }
}

///
/// FieldSpec
///
/// One declared field: logical name, kind, and storage/indexing options.
/// The logical name is what callers use everywhere; the storage location
/// (flat-mode alias or document dot-path) only surfaces at the storage and
/// declaration boundaries.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    #[serde(default)]
    location: Option<String>,
    #[serde(default = "default_separator")]
    separator: String,
    #[serde(default)]
    sortable: bool,
    #[serde(default = "default_indexed")]
    indexed: bool,
    #[serde(default)]
    case_sensitive: bool,
    #[serde(default)]
    text: TextOptions,
}

impl FieldSpec {
    pub const DEFAULT_SEPARATOR: &'static str = "|";

    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            location: None,
            separator: Self::DEFAULT_SEPARATOR.to_string(),
            sortable: false,
            indexed: true,
            case_sensitive: false,
            text: TextOptions::new(),
        }
    }

    /// Store under an explicit alias (flat mode) or dot-path (document mode)
    /// instead of the field name.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Join/split token for flat-mode string arrays.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: TextOptions) -> Self {
        self.text = text;
        self
    }

    #[must_use]
    pub const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    #[must_use]
    pub const fn unindexed(mut self) -> Self {
        self.indexed = false;
        self
    }

    #[must_use]
    pub const fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Physical storage location, defaulting to the logical name.
    #[must_use]
    pub fn location(&self) -> &str {
        self.location.as_deref().unwrap_or(&self.name)
    }

    /// Whether a distinct location was declared.
    #[must_use]
    pub const fn has_explicit_location(&self) -> bool {
        self.location.is_some()
    }

    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    #[must_use]
    pub const fn declares_sortable(&self) -> bool {
        self.sortable
    }

    #[must_use]
    pub const fn is_indexed(&self) -> bool {
        self.indexed
    }

    #[must_use]
    pub const fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    #[must_use]
    pub const fn text(&self) -> &TextOptions {
        &self.text
    }

    /// The name the search engine knows this field by. Flat mode indexes the
    /// stored hash field itself; document mode indexes the dot-path under an
    /// attribute alias equal to the logical name.
    #[must_use]
    pub fn attribute(&self, mode: StorageMode) -> &str {
        match mode {
            StorageMode::Flat => self.location(),
            StorageMode::Document => &self.name,
        }
    }

    /// The path portion of a search-field declaration. The `[*]` multi-value
    /// suffix appears here and only here; queries never see it.
    #[must_use]
    pub fn search_location(&self, mode: StorageMode) -> String {
        match mode {
            StorageMode::Flat => self.location().to_string(),
            StorageMode::Document => {
                if self.kind == FieldKind::StringArray {
                    format!("$.{}[*]", self.location())
                } else {
                    format!("$.{}", self.location())
                }
            }
        }
    }
}

fn default_stemming() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

fn default_separator() -> String {
    FieldSpec::DEFAULT_SEPARATOR.to_string()
}

fn default_indexed() -> bool {
    true
}

///
/// TESTS
///
