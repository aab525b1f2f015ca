//! Structural validation adapter
//!
//! Runs a document's content through the compiled JSON Schema for its type
//! and converts every error into a [`RawValidationFinding`]. All errors are
//! collected; validation never stops at the first.

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::ValidationError;
use serde_json::Value as JsonValue;
use ubml_core::{
    pointer_join, schema_location, DocumentType, FindingParams, Keyword, RawValidationFinding,
    SchemaContext, Value,
};

use crate::registry::{SchemaError, SchemaRegistry};

/// Validates document content against the registry's schemas
#[derive(Debug, Clone, Copy)]
pub struct SchemaValidator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Validate `content` against the schema registered for `document_type`
    ///
    /// Returns [`SchemaError::MissingSchema`] when the type has no schema.
    pub fn validate(
        &self,
        content: &Value,
        document_type: DocumentType,
    ) -> Result<Vec<RawValidationFinding>, SchemaError> {
        let registered = self.registry.get(document_type)?;
        let instance = content.to_json();

        let mut findings = Vec::new();
        for error in registered.validator.iter_errors(&instance) {
            convert_error(&error, &registered.schema, &mut findings);
        }

        tracing::debug!(
            schema_id = %registered.id,
            findings = findings.len(),
            "schema validation finished"
        );
        Ok(findings)
    }

    /// Schema facts that help explain `finding`
    pub fn context_for(
        &self,
        document_type: DocumentType,
        finding: &RawValidationFinding,
    ) -> SchemaContext {
        let Ok(registered) = self.registry.get(document_type) else {
            return SchemaContext::default();
        };

        let mut context = SchemaContext::default();
        let parent = parent_pointer(&finding.schema_path);
        let Some(resolved) = resolve_path(self.registry, &registered.id, &registered.schema, parent)
        else {
            return context;
        };

        context.schema_location = Some(schema_location(resolved.schema_id, &resolved.pointer));
        if finding.keyword == Keyword::AdditionalProperties {
            if let Some(properties) = resolved.node.get("properties").and_then(JsonValue::as_object) {
                context.valid_properties = properties.keys().cloned().collect();
            }
        }
        context
    }
}

fn convert_error(
    error: &ValidationError<'_>,
    schema: &JsonValue,
    findings: &mut Vec<RawValidationFinding>,
) {
    let instance_path = error.instance_path.to_string();
    let schema_path = error.schema_path.to_string();
    let instance: &JsonValue = &error.instance;

    let (keyword, params, data) = match &error.kind {
        ValidationErrorKind::Required { property } => {
            let property = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            (Keyword::Required, FindingParams::Required { property }, None)
        }
        ValidationErrorKind::Type { kind } => {
            let expected = match kind {
                TypeKind::Single(t) => vec![t.to_string()],
                TypeKind::Multiple(_) => declared_types(schema, &schema_path),
            };
            (Keyword::Type, FindingParams::Type { expected }, Some(instance.clone()))
        }
        ValidationErrorKind::Enum { options } => {
            let allowed = options.as_array().cloned().unwrap_or_default();
            (Keyword::Enum, FindingParams::Enum { allowed }, Some(instance.clone()))
        }
        ValidationErrorKind::Constant { expected_value } => (
            Keyword::Const,
            FindingParams::Enum {
                allowed: vec![expected_value.clone()],
            },
            Some(instance.clone()),
        ),
        ValidationErrorKind::Pattern { pattern } => (
            Keyword::Pattern,
            FindingParams::Pattern {
                pattern: pattern.clone(),
            },
            Some(instance.clone()),
        ),
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            // One finding per property, located at the property itself
            for property in unexpected {
                findings.push(RawValidationFinding {
                    keyword: Keyword::AdditionalProperties,
                    instance_path: pointer_join(&instance_path, property),
                    schema_path: schema_path.clone(),
                    params: FindingParams::AdditionalProperties {
                        property: property.clone(),
                    },
                    data: instance.get(property.as_str()).cloned(),
                });
            }
            return;
        }
        _ => {
            let keyword = match last_segment(&schema_path) {
                "oneOf" => Keyword::OneOf,
                "anyOf" => Keyword::AnyOf,
                other => Keyword::Other(other.to_string()),
            };
            (
                keyword,
                FindingParams::Other {
                    message: error.to_string(),
                },
                Some(instance.clone()),
            )
        }
    };

    findings.push(RawValidationFinding {
        keyword,
        instance_path,
        schema_path,
        params,
        data,
    });
}

/// `type` keyword value at `schema_path`, as a list
fn declared_types(schema: &JsonValue, schema_path: &str) -> Vec<String> {
    match schema.pointer(schema_path) {
        Some(JsonValue::String(t)) => vec![t.clone()],
        Some(JsonValue::Array(types)) => types
            .iter()
            .filter_map(JsonValue::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// A schema node reached by following a schema path
#[derive(Debug)]
struct Resolved<'s> {
    schema_id: &'s str,
    /// Pointer to the node inside the schema named by `schema_id`
    pointer: String,
    node: &'s JsonValue,
}

/// Follow a schema path from the root of a document schema
///
/// A `$ref` segment jumps to its target, in the same schema or in another
/// registered one, so the result names where the node is declared.
fn resolve_path<'s>(
    registry: &'s SchemaRegistry,
    schema_id: &'s str,
    schema: &'s JsonValue,
    path: &str,
) -> Option<Resolved<'s>> {
    let mut document = schema;
    let mut current = Resolved {
        schema_id,
        pointer: String::new(),
        node: schema,
    };

    for segment in path.split('/').skip(1) {
        if segment == "$ref" {
            let reference = current.node.get("$ref")?.as_str()?;
            let (uri, fragment) = reference.split_once('#').unwrap_or((reference, ""));
            if !uri.is_empty() {
                let (id, target) = registry.resolve_uri(uri)?;
                current.schema_id = id;
                document = target;
            }
            current.node = if fragment.is_empty() {
                document
            } else {
                document.pointer(fragment)?
            };
            current.pointer = fragment.to_string();
        } else {
            let key = segment.replace("~1", "/").replace("~0", "~");
            current.node = match current.node {
                JsonValue::Object(map) => map.get(&key)?,
                JsonValue::Array(items) => items.get(key.parse::<usize>().ok()?)?,
                _ => return None,
            };
            current.pointer = format!("{}/{}", current.pointer, segment);
        }
    }
    Some(current)
}

fn parent_pointer(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[..index],
        None => "",
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ubml_core::Document;

    fn registry() -> SchemaRegistry {
        let process = json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["processes"],
            "properties": {
                "ubml": { "type": "string" },
                "processes": {
                    "type": "object",
                    "additionalProperties": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["name"],
                        "properties": {
                            "name": { "type": "string" },
                            "kind": { "enum": ["action", "milestone", "decision"] },
                            "duration": { "type": "string", "pattern": "^\\d+(min|h|d)$" },
                            "tags": { "type": "array", "items": { "type": "string" } },
                            "level": { "type": ["integer", "null"] }
                        }
                    }
                }
            }
        });
        SchemaRegistry::builder()
            .schema(DocumentType::Process, process)
            .build()
            .unwrap()
    }

    fn document(text: &str) -> Document {
        ubml_parser::parse(text, Some("t.process.ubml.yaml")).document.unwrap()
    }

    #[test]
    fn valid_document_has_no_findings() {
        let registry = registry();
        let doc = document("processes:\n  PR00001:\n    name: Intake\n    kind: action\n");
        let findings = SchemaValidator::new(&registry)
            .validate(&doc.content, DocumentType::Process)
            .unwrap();
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn collects_every_violation() {
        let registry = registry();
        let doc = document(
            "\
processes:
  PR00001:
    kind: acton
    duration: '90'
    tags: urgent
    nmae: Intake
",
        );
        let findings = SchemaValidator::new(&registry)
            .validate(&doc.content, DocumentType::Process)
            .unwrap();

        let keywords: Vec<&Keyword> = findings.iter().map(|f| &f.keyword).collect();
        assert!(keywords.contains(&&Keyword::Required));
        assert!(keywords.contains(&&Keyword::Enum));
        assert!(keywords.contains(&&Keyword::Pattern));
        assert!(keywords.contains(&&Keyword::Type));
        assert!(keywords.contains(&&Keyword::AdditionalProperties));

        let unknown = findings
            .iter()
            .find(|f| f.keyword == Keyword::AdditionalProperties)
            .unwrap();
        assert_eq!(unknown.instance_path, "/processes/PR00001/nmae");
        assert!(doc.source_location(&unknown.instance_path).is_some());

        let required = findings.iter().find(|f| f.keyword == Keyword::Required).unwrap();
        assert_eq!(
            required.params,
            FindingParams::Required { property: "name".into() }
        );

        let enum_finding = findings.iter().find(|f| f.keyword == Keyword::Enum).unwrap();
        assert_eq!(enum_finding.data, Some(json!("acton")));
        assert!(matches!(&enum_finding.params, FindingParams::Enum { allowed } if allowed.len() == 3));

        let type_finding = findings.iter().find(|f| f.keyword == Keyword::Type).unwrap();
        assert_eq!(type_finding.params, FindingParams::Type { expected: vec!["array".into()] });
    }

    #[test]
    fn multiple_types_read_from_schema() {
        let registry = registry();
        let doc = document("processes:\n  PR00001:\n    name: A\n    level: high\n");
        let findings = SchemaValidator::new(&registry)
            .validate(&doc.content, DocumentType::Process)
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].params,
            FindingParams::Type { expected: vec!["integer".into(), "null".into()] }
        );
    }

    #[test]
    fn context_lists_valid_properties() {
        let registry = registry();
        let validator = SchemaValidator::new(&registry);
        let doc = document("processes:\n  PR00001:\n    name: A\n    nmae: B\n");
        let findings = validator.validate(&doc.content, DocumentType::Process).unwrap();
        let context = validator.context_for(DocumentType::Process, &findings[0]);
        assert!(context.valid_properties.contains(&"name".to_string()));
        assert!(context.valid_properties.contains(&"duration".to_string()));
    }

    #[test]
    fn missing_schema_is_an_error_not_a_finding() {
        let registry = registry();
        let doc = document("processes: {}\n");
        let err = SchemaValidator::new(&registry)
            .validate(&doc.content, DocumentType::Actors)
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingSchema(DocumentType::Actors)));
    }

    fn ref_registry() -> SchemaRegistry {
        let common = json!({
            "$id": "https://ubml.dev/schemas/common.schema.json",
            "$defs": {
                "level": { "enum": ["low", "high"] }
            }
        });
        let actors = json!({
            "$id": "https://ubml.dev/schemas/actors.schema.json",
            "type": "object",
            "properties": {
                "actors": { "type": "object", "additionalProperties": { "$ref": "#/$defs/actor" } }
            },
            "$defs": {
                "actor": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "name": {},
                        "level": { "$ref": "common.schema.json#/$defs/level" }
                    }
                }
            }
        });
        SchemaRegistry::builder()
            .shared(common)
            .schema(DocumentType::Actors, actors)
            .build()
            .unwrap()
    }

    #[test]
    fn resolve_follows_local_and_shared_refs() {
        let registry = ref_registry();
        let registered = registry.get(DocumentType::Actors).unwrap();

        let local = resolve_path(
            &registry,
            &registered.id,
            &registered.schema,
            "/properties/actors/additionalProperties/$ref",
        )
        .unwrap();
        assert_eq!(local.schema_id, "https://ubml.dev/schemas/actors.schema.json");
        assert_eq!(local.pointer, "/$defs/actor");
        assert_eq!(local.node, &registered.schema["$defs"]["actor"]);

        let shared = resolve_path(
            &registry,
            &registered.id,
            &registered.schema,
            "/properties/actors/additionalProperties/$ref/properties/level/$ref",
        )
        .unwrap();
        assert_eq!(shared.schema_id, "https://ubml.dev/schemas/common.schema.json");
        assert_eq!(shared.pointer, "/$defs/level");

        assert!(resolve_path(&registry, &registered.id, &registered.schema, "/properties/missing").is_none());
    }

    #[test]
    fn context_names_declaring_location() {
        let registry = ref_registry();
        let validator = SchemaValidator::new(&registry);
        let doc = ubml_parser::parse(
            "actors:\n  AC00001:\n    nmae: Clerk\n",
            Some("t.actors.ubml.yaml"),
        )
        .document
        .unwrap();
        let findings = validator.validate(&doc.content, DocumentType::Actors).unwrap();
        assert_eq!(findings.len(), 1);

        let context = validator.context_for(DocumentType::Actors, &findings[0]);
        assert_eq!(
            context.schema_location.as_deref(),
            Some("https://ubml.dev/schemas/actors.schema.json#/$defs/actor")
        );
        let mut properties = context.valid_properties.clone();
        properties.sort();
        assert_eq!(properties, vec!["level", "name"]);
    }

    #[test]
    fn pointer_helpers() {
        assert_eq!(parent_pointer("/properties/a/additionalProperties"), "/properties/a");
        assert_eq!(parent_pointer("/additionalProperties"), "");
        assert_eq!(last_segment("/properties/a/oneOf"), "oneOf");
    }
}
