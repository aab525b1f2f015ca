//! UBML Core
//!
//! Core domain model with stable, versioned types.
//! Never rename diagnostic codes - they are part of the public API.

pub mod diagnostic;
pub mod document;
pub mod ids;
pub mod finding;
pub mod hints;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, Location};
pub use document::{Document, DocumentMeta, DocumentType, Mapping, Scalar, SourceIndex, SourceLocation, Value, pointer_escape, pointer_join};
pub use ids::{ElementType, IdFormat, Identifier};
pub use finding::{FindingParams, Keyword, RawValidationFinding, ReferenceFinding, ReferenceFindingKind, SchemaContext, SiteRef};
pub use hints::{schema_location, HintCatalog, NestingHint, PatternHint};
pub use report::{Report, ReportVersion, ValidationResult};
pub use config::{Config, ConfigError, IgnoreRules, SeverityThreshold, ValidationOptions};
