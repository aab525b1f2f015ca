//! Schema registry and structural validation
//!
//! Schemas are JSON Schema documents (JSON or YAML), one per document type,
//! plus any number of shared definition files they `$ref`. Everything is
//! compiled once when the registry is built and never changes afterwards.

pub mod registry;
pub mod hints;
pub mod validate;

pub use registry::{RegisteredSchema, SchemaError, SchemaRegistry, SchemaRegistryBuilder, SharedRegistry};
pub use hints::extract_hints;
pub use validate::SchemaValidator;
