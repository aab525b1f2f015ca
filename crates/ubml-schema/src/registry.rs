//! Schema loading and compilation
//!
//! The [`SchemaRegistry`] holds one compiled validator per document type.
//! Shared definition files (anything whose name is not a document type) are
//! only used to resolve `$ref`s.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use thiserror::Error;
use ubml_core::{DocumentType, HintCatalog};

use crate::hints::extract_hints;

/// URI prefix given to schemas that declare no `$id`
pub const SCHEMA_URI_PREFIX: &str = "https://ubml.dev/schemas/";

/// Errors raised while building or using the registry
///
/// These are configuration problems, never document problems.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A schema file could not be read or parsed.
    #[error("failed to load schema {path}: {reason}")]
    Load { path: String, reason: String },

    /// A schema could not be compiled into a validator.
    #[error("failed to compile schema {schema_id}: {reason}")]
    Compile { schema_id: String, reason: String },

    /// Two schemas declare the same `$id`.
    #[error("duplicate schema id: {0}")]
    DuplicateId(String),

    /// No schema is registered for a document type.
    #[error("no schema registered for document type '{0}'")]
    MissingSchema(DocumentType),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolves `$ref` URIs against the schemas handed to the builder
struct LocalSchemaRetriever {
    schemas: HashMap<String, Value>,
}

impl LocalSchemaRetriever {
    fn lookup(&self, uri: &str) -> Option<&Value> {
        lookup_schema(&self.schemas, uri).map(|(_, schema)| schema)
    }
}

/// Find a schema by `$id`, falling back to the last path segment
fn lookup_schema<'s>(schemas: &'s HashMap<String, Value>, uri: &str) -> Option<(&'s str, &'s Value)> {
    if let Some((id, schema)) = schemas.get_key_value(uri) {
        return Some((id.as_str(), schema));
    }
    let file = uri.rsplit('/').next()?;
    schemas
        .iter()
        .find(|(id, _)| id.rsplit('/').next() == Some(file))
        .map(|(id, schema)| (id.as_str(), schema))
}

impl jsonschema::Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &jsonschema::Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        self.lookup(uri_str)
            .cloned()
            .ok_or_else(|| format!("schema not found for URI: {uri_str}").into())
    }
}

/// A compiled schema for one document type
pub struct RegisteredSchema {
    pub id: String,
    pub document_type: DocumentType,
    pub schema: Value,
    pub(crate) validator: jsonschema::Validator,
}

impl std::fmt::Debug for RegisteredSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredSchema")
            .field("id", &self.id)
            .field("document_type", &self.document_type)
            .finish()
    }
}

/// Collects schemas before compiling them together
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    shared: Vec<Value>,
    documents: Vec<(DocumentType, Value)>,
}

impl SchemaRegistryBuilder {
    /// Add the schema for a document type
    pub fn schema(mut self, document_type: DocumentType, schema: Value) -> Self {
        self.documents.push((document_type, schema));
        self
    }

    /// Add a definitions file other schemas `$ref`
    pub fn shared(mut self, schema: Value) -> Self {
        self.shared.push(schema);
        self
    }

    /// Compile every document schema
    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        let mut by_id: HashMap<String, Value> = HashMap::new();
        let mut documents = Vec::new();

        for (index, mut schema) in self.shared.into_iter().enumerate() {
            let id = ensure_id(&mut schema, &format!("shared-{index}.schema.json"));
            if by_id.insert(id.clone(), schema).is_some() {
                return Err(SchemaError::DuplicateId(id));
            }
        }

        for (document_type, mut schema) in self.documents {
            let id = ensure_id(&mut schema, &format!("{}.schema.json", document_type));
            if by_id.insert(id.clone(), schema.clone()).is_some() {
                return Err(SchemaError::DuplicateId(id));
            }
            documents.push((document_type, id, schema));
        }

        let mut schemas = BTreeMap::new();

        for (document_type, id, schema) in documents {
            let retriever = LocalSchemaRetriever {
                schemas: by_id.clone(),
            };

            let validator = jsonschema::options()
                .with_retriever(retriever)
                .build(&schema)
                .map_err(|e| SchemaError::Compile {
                    schema_id: id.clone(),
                    reason: e.to_string(),
                })?;

            tracing::debug!(schema_id = %id, %document_type, "compiled schema");

            schemas.insert(
                document_type,
                RegisteredSchema {
                    id,
                    document_type,
                    schema,
                    validator,
                },
            );
        }

        let mut hints = HintCatalog::new();
        let mut ids: Vec<&String> = by_id.keys().collect();
        ids.sort();
        for id in ids {
            hints.merge(extract_hints(id, &by_id[id]));
        }

        Ok(SchemaRegistry {
            schemas,
            sources: by_id,
            hints,
        })
    }
}

/// Give a schema a `$id` if it has none, and return it
fn ensure_id(schema: &mut Value, file_name: &str) -> String {
    if let Some(id) = schema.get("$id").and_then(|v| v.as_str()) {
        return id.to_string();
    }
    let id = format!("{SCHEMA_URI_PREFIX}{file_name}");
    if let Some(object) = schema.as_object_mut() {
        object.insert("$id".to_string(), Value::String(id.clone()));
    }
    id
}

/// Immutable set of compiled schemas, one per document type
pub struct SchemaRegistry {
    schemas: BTreeMap<DocumentType, RegisteredSchema>,
    /// Every schema by `$id`, shared definitions included
    sources: HashMap<String, Value>,
    hints: HintCatalog,
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("document_types", &self.schemas.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Load every `*.schema.json` / `*.schema.yaml` file in `dir`
    ///
    /// `<type>.schema.*` files become document schemas; any other schema
    /// file is a shared definitions file.
    pub fn from_dir(dir: &Path) -> Result<Self, SchemaError> {
        let mut builder = Self::builder();
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        for path in paths {
            let Some(file_name) = path.file_name().and_then(|f| f.to_str()) else {
                continue;
            };
            let Some((stem, format)) = split_schema_name(file_name) else {
                continue;
            };

            let schema = load_schema_file(&path, format)?;
            builder = match stem.parse::<DocumentType>() {
                Ok(document_type) => builder.schema(document_type, schema),
                Err(_) => builder.shared(schema),
            };
        }

        builder.build()
    }

    /// Schema for a document type
    pub fn get(&self, document_type: DocumentType) -> Result<&RegisteredSchema, SchemaError> {
        self.schemas
            .get(&document_type)
            .ok_or(SchemaError::MissingSchema(document_type))
    }

    pub fn contains(&self, document_type: DocumentType) -> bool {
        self.schemas.contains_key(&document_type)
    }

    pub fn document_types(&self) -> impl Iterator<Item = DocumentType> + '_ {
        self.schemas.keys().copied()
    }

    /// Schema a `$ref` URI points at, with its `$id`
    pub fn resolve_uri(&self, uri: &str) -> Option<(&str, &Value)> {
        lookup_schema(&self.sources, uri)
    }

    /// Hints declared across all schemas, keyed by where they are declared
    pub fn hints(&self) -> &HintCatalog {
        &self.hints
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum SchemaFormat {
    Json,
    Yaml,
}

fn split_schema_name(file_name: &str) -> Option<(&str, SchemaFormat)> {
    if let Some(stem) = file_name.strip_suffix(".schema.json") {
        Some((stem, SchemaFormat::Json))
    } else if let Some(stem) = file_name
        .strip_suffix(".schema.yaml")
        .or_else(|| file_name.strip_suffix(".schema.yml"))
    {
        Some((stem, SchemaFormat::Yaml))
    } else {
        None
    }
}

fn load_schema_file(path: &Path, format: SchemaFormat) -> Result<Value, SchemaError> {
    let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Load {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let parsed = match format {
        SchemaFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
        SchemaFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
    };

    parsed.map_err(|reason| SchemaError::Load {
        path: path.display().to_string(),
        reason,
    })
}

/// Registry handle that can be swapped while validations run
///
/// Each run takes a [`snapshot`](Self::snapshot) and keeps using it, so a
/// run sees either the old or the new registry, never a mix.
#[derive(Debug)]
pub struct SharedRegistry {
    current: RwLock<Arc<SchemaRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    pub fn snapshot(&self) -> Arc<SchemaRegistry> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Install a new registry, returning the previous one
    pub fn replace(&self, registry: SchemaRegistry) -> Arc<SchemaRegistry> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, Arc::new(registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn actors_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "actors": { "type": "object" }
            }
        })
    }

    #[test]
    fn build_assigns_ids() {
        let registry = SchemaRegistry::builder()
            .schema(DocumentType::Actors, actors_schema())
            .build()
            .unwrap();

        let schema = registry.get(DocumentType::Actors).unwrap();
        assert_eq!(schema.id, "https://ubml.dev/schemas/actors.schema.json");
        assert_eq!(schema.schema["$id"], schema.id.as_str());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_schema_is_configuration_error() {
        let registry = SchemaRegistry::builder()
            .schema(DocumentType::Actors, actors_schema())
            .build()
            .unwrap();
        let err = registry.get(DocumentType::Process).unwrap_err();
        assert!(matches!(err, SchemaError::MissingSchema(DocumentType::Process)));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let schema = json!({ "$id": "urn:same", "type": "object" });
        let err = SchemaRegistry::builder()
            .schema(DocumentType::Actors, schema.clone())
            .schema(DocumentType::Process, schema)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateId(id) if id == "urn:same"));
    }

    #[test]
    fn invalid_schema_fails_to_compile() {
        let err = SchemaRegistry::builder()
            .schema(DocumentType::Actors, json!({ "type": 12 }))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::Compile { .. }));
    }

    #[test]
    fn shared_definitions_resolve() {
        let common = json!({
            "$id": "https://ubml.dev/schemas/common.schema.json",
            "$defs": {
                "actorId": { "type": "string", "pattern": "^AC\\d{5,}$" }
            }
        });
        let actors = json!({
            "type": "object",
            "properties": {
                "owner": { "$ref": "common.schema.json#/$defs/actorId" }
            }
        });
        let registry = SchemaRegistry::builder()
            .shared(common)
            .schema(DocumentType::Actors, actors)
            .build()
            .unwrap();
        let schema = registry.get(DocumentType::Actors).unwrap();
        assert!(schema.validator.is_valid(&json!({ "owner": "AC00001" })));
        assert!(!schema.validator.is_valid(&json!({ "owner": "XX1" })));
    }

    #[test]
    fn shared_registry_swaps_atomically() {
        let shared = SharedRegistry::new(SchemaRegistry::builder().build().unwrap());
        let before = shared.snapshot();
        assert!(before.is_empty());

        let previous = shared.replace(
            SchemaRegistry::builder()
                .schema(DocumentType::Actors, actors_schema())
                .build()
                .unwrap(),
        );
        assert!(previous.is_empty());
        // The old snapshot is unchanged
        assert!(before.is_empty());
        assert!(shared.snapshot().contains(DocumentType::Actors));
    }

    #[test]
    fn schema_file_names() {
        assert!(matches!(split_schema_name("process.schema.json"), Some(("process", SchemaFormat::Json))));
        assert!(matches!(split_schema_name("common.schema.yaml"), Some(("common", SchemaFormat::Yaml))));
        assert!(split_schema_name("README.md").is_none());
    }
}
