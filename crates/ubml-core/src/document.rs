//! Parsed document model
//!
//! A [`Document`] is the located, typed result of parsing one `.ubml.yaml`
//! file. Content is a tagged tree so every structural walk has to handle each
//! shape explicitly.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Leaf value of a document tree
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Name of the scalar's type, as used in schema messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "number",
            Self::String(_) => "string",
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

/// Mapping with keys kept in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(String, Value)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, replacing the value if the key already exists
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

/// Document content tree
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    /// Shorthand for a string scalar
    pub fn string(s: impl Into<String>) -> Self {
        Self::Scalar(Scalar::String(s.into()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Name of the value's type, as used in schema messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(s) => s.type_name(),
            Self::Sequence(_) => "array",
            Self::Mapping(_) => "object",
        }
    }

    /// Resolve a JSON-pointer style path against this value
    pub fn pointer(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(self);
        }
        let rest = path.strip_prefix('/')?;
        let mut current = self;
        for raw in rest.split('/') {
            let segment = pointer_unescape(raw);
            current = match current {
                Self::Mapping(m) => m.get(&segment)?,
                Self::Sequence(items) => items.get(segment.parse::<usize>().ok()?)?,
                Self::Scalar(_) => return None,
            };
        }
        Some(current)
    }

    /// Convert into a JSON value for the schema engine
    ///
    /// A non-finite float has no JSON form and becomes null. Parsed documents
    /// never hold one; the loader rejects `.nan` and `.inf`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Scalar(Scalar::Null) => serde_json::Value::Null,
            Self::Scalar(Scalar::Bool(b)) => serde_json::Value::Bool(*b),
            Self::Scalar(Scalar::Int(i)) => serde_json::Value::from(*i),
            Self::Scalar(Scalar::Float(x)) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Scalar(Scalar::String(s)) => serde_json::Value::String(s.clone()),
            Self::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Mapping(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.to_string(), v.to_json())).collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(Scalar::Null) => serializer.serialize_unit(),
            Self::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Self::Scalar(Scalar::Int(i)) => serializer.serialize_i64(*i),
            Self::Scalar(Scalar::Float(x)) => serializer.serialize_f64(*x),
            Self::Scalar(Scalar::String(s)) => serializer.serialize_str(s),
            Self::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Mapping(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

/// Escape one path segment (`~` and `/`)
pub fn pointer_escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn pointer_unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Append one segment to a JSON-pointer style path
pub fn pointer_join(base: &str, segment: &str) -> String {
    format!("{}/{}", base, pointer_escape(segment))
}

/// 1-based line/column position in the original text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Reverse index from structural path to source position
///
/// Immutable once built. Lookups are exact; an untracked path is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceIndex {
    positions: BTreeMap<String, SourceLocation>,
}

impl SourceIndex {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, SourceLocation)>) -> Self {
        Self {
            positions: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, path: &str) -> Option<SourceLocation> {
        self.positions.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(|k| k.as_str())
    }
}

/// Kind of UBML document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Workspace,
    Process,
    Actors,
    Entities,
    Hypotheses,
    Scenarios,
    Strategy,
    Metrics,
    Mining,
    Views,
    Links,
    Glossary,
}

impl DocumentType {
    pub const ALL: [DocumentType; 12] = [
        Self::Workspace,
        Self::Process,
        Self::Actors,
        Self::Entities,
        Self::Hypotheses,
        Self::Scenarios,
        Self::Strategy,
        Self::Metrics,
        Self::Mining,
        Self::Views,
        Self::Links,
        Self::Glossary,
    ];

    /// Name used in filenames (`<name>.<type>.ubml.yaml`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Process => "process",
            Self::Actors => "actors",
            Self::Entities => "entities",
            Self::Hypotheses => "hypotheses",
            Self::Scenarios => "scenarios",
            Self::Strategy => "strategy",
            Self::Metrics => "metrics",
            Self::Mining => "mining",
            Self::Views => "views",
            Self::Links => "links",
            Self::Glossary => "glossary",
        }
    }

    /// Top-level keys characteristic of this document type
    pub fn signature_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Workspace => &["organization"],
            Self::Process => &["processes"],
            Self::Actors => &["actors", "personas", "skills", "resources", "equipment"],
            Self::Entities => &["entities", "documents", "locations"],
            Self::Hypotheses => &["hypothesisTrees", "hypotheses"],
            Self::Scenarios => &["scenarios"],
            Self::Strategy => &["valueStreams", "capabilities", "products", "services", "portfolios"],
            Self::Metrics => &["kpis", "metrics"],
            Self::Mining => &["miningSources"],
            Self::Views => &["views"],
            Self::Links => &["links"],
            Self::Glossary => &["terms"],
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown document type '{}'", s))
    }
}

/// Document metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Value of the top-level `ubml` key
    pub declared_version: Option<String>,

    /// Detected document type, if any
    pub document_type: Option<DocumentType>,

    /// Filename the text came from
    pub filename: String,
}

/// One parsed input file
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub content: Value,
    pub meta: DocumentMeta,
    source_index: SourceIndex,
}

impl Document {
    pub fn new(content: Value, meta: DocumentMeta, source_index: SourceIndex) -> Self {
        Self {
            content,
            meta,
            source_index,
        }
    }

    /// Position of the value at `path`, if that path was tracked
    pub fn source_location(&self, path: &str) -> Option<SourceLocation> {
        self.source_index.get(path)
    }

    pub fn source_index(&self) -> &SourceIndex {
        &self.source_index
    }

    pub fn filename(&self) -> &str {
        &self.meta.filename
    }
}
