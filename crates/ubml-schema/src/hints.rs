//! Hint extraction from schema annotations
//!
//! Recognised annotations (ignored by the validator itself):
//!
//! - `x-ubml-hint` next to `pattern`: a string, or `{ description, example }`
//! - `x-ubml-mistakes` next to `enum`: map of wrong value → explanation
//! - `x-ubml-nesting` on an object: map of misplaced property →
//!   `{ under, example }`
//! - `examples` on a property schema: first entry becomes the usage example

use serde_json::{Map, Value};
use ubml_core::{pointer_join, schema_location, HintCatalog, NestingHint, PatternHint};

/// Collect every hint annotation in the schema with id `schema_id`
///
/// Scoped entries are keyed by the location of the object that carries the
/// annotation.
pub fn extract_hints(schema_id: &str, schema: &Value) -> HintCatalog {
    let mut catalog = HintCatalog::new();
    walk(schema_id, schema, "", &mut catalog);
    catalog
}

fn walk(schema_id: &str, value: &Value, pointer: &str, catalog: &mut HintCatalog) {
    match value {
        Value::Object(object) => {
            collect_from_object(&schema_location(schema_id, pointer), object, catalog);
            for (key, child) in object {
                walk(schema_id, child, &pointer_join(pointer, key), catalog);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                walk(schema_id, item, &format!("{}/{}", pointer, index), catalog);
            }
        }
        _ => {}
    }
}

fn collect_from_object(location: &str, object: &Map<String, Value>, catalog: &mut HintCatalog) {
    if let (Some(pattern), Some(hint)) = (
        object.get("pattern").and_then(Value::as_str),
        object.get("x-ubml-hint"),
    ) {
        let (description, example) = match hint {
            Value::String(s) => (Some(s.clone()), None),
            Value::Object(h) => (
                h.get("description").and_then(Value::as_str).map(str::to_string),
                h.get("example").map(scalar_text),
            ),
            _ => (None, None),
        };
        if let Some(description) = description {
            catalog.add_pattern(PatternHint {
                pattern: pattern.to_string(),
                description,
                example,
            });
        }
    }

    if let Some(Value::Object(mistakes)) = object.get("x-ubml-mistakes") {
        for (wrong, hint) in mistakes {
            if let Some(hint) = hint.as_str() {
                catalog.add_enum_mistake(location, wrong, hint);
            }
        }
    }

    if let Some(Value::Object(nesting)) = object.get("x-ubml-nesting") {
        for (property, spec) in nesting {
            let Some(under) = spec.get("under").and_then(Value::as_str) else {
                continue;
            };
            let example = spec
                .get("example")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{under}:\n  {property}: ..."));
            catalog.add_nesting(
                location,
                NestingHint {
                    property: property.clone(),
                    parent: under.to_string(),
                    example,
                },
            );
        }
    }

    if let Some(Value::Object(properties)) = object.get("properties") {
        for (property, sub) in properties {
            let first = sub
                .get("examples")
                .and_then(Value::as_array)
                .and_then(|examples| examples.first());
            if let Some(example) = first {
                catalog.add_property_example(location, property, render_example(property, example));
            }
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render `property: example` as YAML
fn render_example(property: &str, example: &Value) -> String {
    let mut wrapper = Map::new();
    wrapper.insert(property.to_string(), example.clone());
    serde_yaml::to_string(&Value::Object(wrapper))
        .map(|s| s.trim_end().to_string())
        .unwrap_or_else(|_| format!("{property}: {}", scalar_text(example)))
}
