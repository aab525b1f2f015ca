//! Single-pass YAML loader
//!
//! The content tree and the source index are built from one marked event
//! stream, so every indexed path exists in the content and every content path
//! has a position.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use ubml_core::{pointer_join, Mapping, Scalar, SourceIndex, SourceLocation, Value};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Core-schema float syntax; Rust's float parser also accepts `inf` and `nan`
static FLOAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?$").unwrap());

const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Why the loader rejected the text
#[derive(Debug, Clone, PartialEq)]
pub struct LoadError {
    pub message: String,
    pub location: SourceLocation,
}

/// Result of loading one YAML stream
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    /// `None` when the stream holds no document
    pub content: Option<Value>,
    pub index: SourceIndex,
    /// Source text of scalar values directly under the root mapping
    pub top_level_text: HashMap<String, String>,
}

/// Load `text` into content and source index
pub fn load(text: &str) -> Result<Loaded, LoadError> {
    let mut builder = TreeBuilder::default();
    Parser::new_from_str(text)
        .load(&mut builder, true)
        .map_err(|e| LoadError {
            message: e.info().to_string(),
            location: position(e.marker()),
        })?;

    if let Some(error) = builder.error {
        return Err(error);
    }

    Ok(Loaded {
        content: builder.root,
        index: SourceIndex::from_entries(builder.entries),
        top_level_text: builder.top_level_text,
    })
}

fn position(mark: &Marker) -> SourceLocation {
    SourceLocation::new(mark.line(), mark.col() + 1)
}

enum Frame {
    Mapping {
        path: String,
        mapping: Mapping,
        key: Option<(String, Marker)>,
        anchor: usize,
    },
    Sequence {
        path: String,
        items: Vec<Value>,
        anchor: usize,
    },
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    root: Option<Value>,
    entries: Vec<(String, SourceLocation)>,
    anchors: HashMap<usize, Value>,
    top_level_text: HashMap<String, String>,
    documents: usize,
    error: Option<LoadError>,
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, event: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }

        match event {
            Event::DocumentStart => {
                self.documents += 1;
                if self.documents > 1 {
                    self.fail("Only one YAML document per file is supported", &mark);
                }
            }
            Event::Scalar(text, style, anchor, tag) => {
                if self.expects_key() {
                    self.push_key(text, mark);
                } else {
                    self.scalar_value(text, style, anchor, tag.as_ref(), mark);
                }
            }
            Event::SequenceStart(anchor, _) => {
                if self.reject_complex_key(&mark) {
                    return;
                }
                let path = self.child_path();
                self.entries.push((path.clone(), position(&mark)));
                self.stack.push(Frame::Sequence {
                    path,
                    items: Vec::new(),
                    anchor,
                });
            }
            Event::MappingStart(anchor, _) => {
                if self.reject_complex_key(&mark) {
                    return;
                }
                let path = self.child_path();
                self.entries.push((path.clone(), position(&mark)));
                self.stack.push(Frame::Mapping {
                    path,
                    mapping: Mapping::new(),
                    key: None,
                    anchor,
                });
            }
            Event::SequenceEnd | Event::MappingEnd => self.close(),
            Event::Alias(id) => {
                if self.expects_key() {
                    self.fail("Aliases cannot be used as mapping keys", &mark);
                    return;
                }
                let Some(value) = self.anchors.get(&id).cloned() else {
                    self.fail("Alias refers to a node that contains it", &mark);
                    return;
                };
                let path = self.child_path();
                let at = position(&mark);
                self.entries.push((path.clone(), at));
                index_descendants(&value, &path, at, &mut self.entries);
                self.attach(value);
            }
            _ => {}
        }
    }
}

impl TreeBuilder {
    fn fail(&mut self, message: impl Into<String>, mark: &Marker) {
        self.error = Some(LoadError {
            message: message.into(),
            location: position(mark),
        });
    }

    fn expects_key(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Mapping { key: None, .. }))
    }

    fn reject_complex_key(&mut self, mark: &Marker) -> bool {
        if self.expects_key() {
            self.fail("Mapping keys must be scalars", mark);
            return true;
        }
        false
    }

    fn push_key(&mut self, text: String, mark: Marker) {
        let mut duplicate = false;
        if let Some(Frame::Mapping { mapping, key, .. }) = self.stack.last_mut() {
            if mapping.contains_key(&text) {
                duplicate = true;
            } else {
                *key = Some((text.clone(), mark));
            }
        }
        if duplicate {
            self.fail(format!("Duplicate key '{}' in mapping", text), &mark);
        }
    }

    /// Path the next attached value will have
    fn child_path(&self) -> String {
        match self.stack.last() {
            Some(Frame::Mapping {
                path,
                key: Some((key, _)),
                ..
            }) => pointer_join(path, key),
            Some(Frame::Sequence { path, items, .. }) => format!("{}/{}", path, items.len()),
            _ => String::new(),
        }
    }

    fn scalar_value(
        &mut self,
        text: String,
        style: TScalarStyle,
        anchor: usize,
        tag: Option<&Tag>,
        mark: Marker,
    ) {
        let scalar = resolve_scalar(&text, style, tag);
        if let Scalar::Float(x) = &scalar {
            if !x.is_finite() {
                self.fail(
                    format!("Non-finite number '{}' is not supported; quote it to use it as text", text),
                    &mark,
                );
                return;
            }
        }

        // An empty value has no position of its own; use its key
        let key_mark = match self.stack.last() {
            Some(Frame::Mapping { key: Some((_, key_mark)), .. }) => Some(*key_mark),
            _ => None,
        };
        let at = match (&scalar, key_mark) {
            (Scalar::Null, Some(key_mark)) if style == TScalarStyle::Plain => position(&key_mark),
            _ => position(&mark),
        };

        if self.stack.len() == 1 {
            if let Some(Frame::Mapping { key: Some((key, _)), .. }) = self.stack.last() {
                self.top_level_text.insert(key.clone(), text);
            }
        }

        let path = self.child_path();
        self.entries.push((path, at));
        let value = Value::Scalar(scalar);
        if anchor > 0 {
            self.anchors.insert(anchor, value.clone());
        }
        self.attach(value);
    }

    fn close(&mut self) {
        let (value, anchor) = match self.stack.pop() {
            Some(Frame::Mapping { mapping, anchor, .. }) => (Value::Mapping(mapping), anchor),
            Some(Frame::Sequence { items, anchor, .. }) => (Value::Sequence(items), anchor),
            None => return,
        };
        if anchor > 0 {
            self.anchors.insert(anchor, value.clone());
        }
        self.attach(value);
    }

    fn attach(&mut self, value: Value) {
        match self.stack.last_mut() {
            Some(Frame::Mapping { mapping, key, .. }) => {
                if let Some((key, _)) = key.take() {
                    mapping.insert(key, value);
                }
            }
            Some(Frame::Sequence { items, .. }) => items.push(value),
            None => self.root = Some(value),
        }
    }
}

/// Alias copies are located at the alias itself
fn index_descendants(value: &Value, path: &str, at: SourceLocation, entries: &mut Vec<(String, SourceLocation)>) {
    match value {
        Value::Mapping(mapping) => {
            for (key, child) in mapping.iter() {
                let child_path = pointer_join(path, key);
                entries.push((child_path.clone(), at));
                index_descendants(child, &child_path, at, entries);
            }
        }
        Value::Sequence(items) => {
            for (i, child) in items.iter().enumerate() {
                let child_path = format!("{}/{}", path, i);
                entries.push((child_path.clone(), at));
                index_descendants(child, &child_path, at, entries);
            }
        }
        Value::Scalar(_) => {}
    }
}

fn resolve_scalar(text: &str, style: TScalarStyle, tag: Option<&Tag>) -> Scalar {
    if let Some(tag) = tag.filter(|t| t.handle == CORE_TAG_PREFIX) {
        match tag.suffix.as_str() {
            "str" => return Scalar::String(text.to_string()),
            "null" => return Scalar::Null,
            _ => return resolve_plain(text),
        }
    }
    if style != TScalarStyle::Plain {
        return Scalar::String(text.to_string());
    }
    resolve_plain(text)
}

/// YAML 1.2 core schema resolution of a plain scalar
fn resolve_plain(text: &str) -> Scalar {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => return Scalar::Null,
        "true" | "True" | "TRUE" => return Scalar::Bool(true),
        "false" | "False" | "FALSE" => return Scalar::Bool(false),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => return Scalar::Float(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Scalar::Float(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Scalar::Float(f64::NAN),
        _ => {}
    }

    if let Some(hex) = text.strip_prefix("0x") {
        if let Ok(i) = i64::from_str_radix(hex, 16) {
            return Scalar::Int(i);
        }
    }
    if let Some(octal) = text.strip_prefix("0o") {
        if let Ok(i) = i64::from_str_radix(octal, 8) {
            return Scalar::Int(i);
        }
    }
    if let Ok(i) = text.parse::<i64>() {
        return Scalar::Int(i);
    }
    if FLOAT_RE.is_match(text) {
        if let Ok(x) = text.parse::<f64>() {
            return Scalar::Float(x);
        }
    }
    Scalar::String(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn loaded(text: &str) -> Loaded {
        load(text).unwrap()
    }

    #[test]
    fn nested_mapping_value_starts_at_first_key() {
        let loaded = loaded("actors:\n  AC00001:\n    name: Clerk\n");
        assert_eq!(loaded.index.get("/actors/AC00001"), Some(SourceLocation::new(3, 5)));
        assert_eq!(loaded.index.get("/actors/AC00001/name"), Some(SourceLocation::new(3, 11)));
    }

    #[test]
    fn keys_with_slashes_are_escaped() {
        let loaded = loaded("a/b: 1\n");
        assert!(loaded.index.get("/a~1b").is_some());
        assert!(loaded.index.get("/a/b").is_none());
    }

    #[test]
    fn sequence_items_tracked() {
        let loaded = loaded("tags:\n  - one\n  - two\n");
        assert_eq!(loaded.index.get("/tags/0").unwrap().line, 2);
        assert_eq!(loaded.index.get("/tags/1").unwrap().line, 3);
        assert!(loaded.index.get("/tags/2").is_none());
    }

    #[test]
    fn empty_value_is_located_at_its_key() {
        let loaded = loaded("actors:\n  AC00001:\n    notes:\n");
        assert_eq!(loaded.index.get("/actors/AC00001/notes"), Some(SourceLocation::new(3, 5)));
        assert_eq!(
            loaded.content.unwrap().pointer("/actors/AC00001/notes"),
            Some(&Value::Scalar(Scalar::Null))
        );
    }

    #[test]
    fn anchors_and_aliases_keep_positions() {
        let text = "\
defaults: &d
  name: Clerk
actors:
  AC00001: *d
  AC00002:
    name: Lead
";
        let loaded = loaded(text);
        let content = loaded.content.unwrap();
        assert_eq!(
            content.pointer("/actors/AC00001/name").and_then(Value::as_str),
            Some("Clerk")
        );
        assert_eq!(loaded.index.get("/actors/AC00001"), Some(SourceLocation::new(4, 12)));
        assert_eq!(loaded.index.get("/actors/AC00001/name"), Some(SourceLocation::new(4, 12)));
        assert_eq!(loaded.index.get("/actors/AC00002/name").unwrap().line, 6);
    }

    #[test]
    fn non_string_keys_keep_their_source_text() {
        let loaded = loaded("0x10: a\n~: b\n");
        let content = loaded.content.unwrap();
        assert_eq!(content.pointer("/0x10").and_then(Value::as_str), Some("a"));
        assert_eq!(content.pointer("/~0").and_then(Value::as_str), Some("b"));
        assert!(loaded.index.get("/0x10").is_some());
        assert!(loaded.index.get("/~0").is_some());
    }

    #[test]
    fn keys_that_collide_are_rejected() {
        let err = load("1: a\n\"1\": b\n").unwrap_err();
        assert!(err.message.contains("Duplicate key '1'"), "{}", err.message);
        assert_eq!(err.location, SourceLocation::new(2, 1));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let err = load("ratio: .nan\n").unwrap_err();
        assert!(err.message.contains(".nan"));
        assert_eq!(err.location, SourceLocation::new(1, 8));

        let quoted = loaded("ratio: '.inf'\n");
        assert_eq!(
            quoted.content.unwrap().pointer("/ratio").and_then(Value::as_str),
            Some(".inf")
        );
    }

    #[test]
    fn plain_scalars_follow_core_schema() {
        assert_eq!(resolve_plain("42"), Scalar::Int(42));
        assert_eq!(resolve_plain("0x2A"), Scalar::Int(42));
        assert_eq!(resolve_plain("-1.5e3"), Scalar::Float(-1500.0));
        assert_eq!(resolve_plain("True"), Scalar::Bool(true));
        assert_eq!(resolve_plain("~"), Scalar::Null);
        assert_eq!(resolve_plain("nan"), Scalar::String("nan".into()));
        assert_eq!(resolve_plain("yes"), Scalar::String("yes".into()));
        assert_eq!(resolve_plain("15min"), Scalar::String("15min".into()));
    }

    #[test]
    fn top_level_scalars_keep_source_text() {
        let loaded = loaded("ubml: 1.0\nname: x\nnested:\n  ubml: 2.0\n");
        assert_eq!(loaded.top_level_text.get("ubml").map(String::as_str), Some("1.0"));
        assert_eq!(loaded.top_level_text.len(), 2);
    }

    #[test]
    fn second_document_is_rejected() {
        let err = load("a: 1\n---\nb: 2\n").unwrap_err();
        assert!(err.message.contains("one YAML document"));
    }

    #[test]
    fn empty_stream_has_no_content() {
        assert_eq!(loaded("# only a comment\n").content, None);
    }
}
