//! Raw findings produced by the schema and reference validators
//!
//! Raw findings carry facts only. Turning them into readable diagnostics is
//! the enhancement layer's job.

use crate::diagnostic::DiagnosticCode;
use crate::document::{DocumentType, SourceLocation};
use crate::ids::ElementType;
use serde::{Deserialize, Serialize};

/// Schema keyword that failed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Keyword {
    Required,
    Type,
    Enum,
    Pattern,
    AdditionalProperties,
    Const,
    OneOf,
    AnyOf,
    Other(String),
}

impl Keyword {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::Type => "type",
            Self::Enum => "enum",
            Self::Pattern => "pattern",
            Self::AdditionalProperties => "additionalProperties",
            Self::Const => "const",
            Self::OneOf => "oneOf",
            Self::AnyOf => "anyOf",
            Self::Other(name) => name,
        }
    }

    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::Required => DiagnosticCode::SchemaRequired,
            Self::Type => DiagnosticCode::SchemaType,
            Self::Enum | Self::Const => DiagnosticCode::SchemaEnum,
            Self::Pattern => DiagnosticCode::SchemaPattern,
            Self::AdditionalProperties => DiagnosticCode::SchemaUnknownProperty,
            Self::OneOf | Self::AnyOf | Self::Other(_) => DiagnosticCode::SchemaViolation,
        }
    }
}

/// Keyword-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FindingParams {
    Required { property: String },
    Type { expected: Vec<String> },
    Enum { allowed: Vec<serde_json::Value> },
    Pattern { pattern: String },
    AdditionalProperties { property: String },
    Other { message: String },
}

/// One structural violation reported by the schema engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawValidationFinding {
    pub keyword: Keyword,

    /// Path of the offending value in the document
    pub instance_path: String,

    /// Path of the failing keyword in the schema
    pub schema_path: String,

    pub params: FindingParams,

    /// The offending value, when there is one
    pub data: Option<serde_json::Value>,
}

/// Extra schema facts that help explain a finding
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaContext {
    /// Properties the enclosing object declares
    pub valid_properties: Vec<String>,

    /// Where the schema object holding the failing keyword is declared,
    /// `<schema id>#<json pointer>` with `$ref`s followed
    pub schema_location: Option<String>,
}

/// A place in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRef {
    pub file: String,
    pub path: String,
    pub location: Option<SourceLocation>,
}

/// What a reference finding is about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReferenceFindingKind {
    UndefinedReference {
        id: String,
        property: String,
    },
    WrongReferenceType {
        id: String,
        property: String,
        actual: ElementType,
        expected: Vec<ElementType>,
    },
    DuplicateId {
        id: String,
        first: SiteRef,
    },
    UnusedId {
        id: String,
        element_type: ElementType,
    },
    SingletonViolation {
        document_type: DocumentType,
        first_file: String,
    },
    HierarchyCycle {
        cycle: Vec<String>,
    },
}

/// One cross-document finding, attributed to the site that triggered it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFinding {
    pub kind: ReferenceFindingKind,
    pub site: SiteRef,
}

impl ReferenceFinding {
    pub fn code(&self) -> DiagnosticCode {
        match &self.kind {
            ReferenceFindingKind::UndefinedReference { .. } => DiagnosticCode::UndefinedReference,
            ReferenceFindingKind::WrongReferenceType { .. } => DiagnosticCode::WrongReferenceType,
            ReferenceFindingKind::DuplicateId { .. } => DiagnosticCode::DuplicateId,
            ReferenceFindingKind::UnusedId { .. } => DiagnosticCode::UnusedId,
            ReferenceFindingKind::SingletonViolation { .. } => DiagnosticCode::SingletonViolation,
            ReferenceFindingKind::HierarchyCycle { .. } => DiagnosticCode::HierarchyCycle,
        }
    }

    /// Identifier the finding is about, if it concerns one
    pub fn id(&self) -> Option<&str> {
        match &self.kind {
            ReferenceFindingKind::UndefinedReference { id, .. }
            | ReferenceFindingKind::WrongReferenceType { id, .. }
            | ReferenceFindingKind::DuplicateId { id, .. }
            | ReferenceFindingKind::UnusedId { id, .. } => Some(id),
            ReferenceFindingKind::HierarchyCycle { cycle } => cycle.first().map(|s| s.as_str()),
            ReferenceFindingKind::SingletonViolation { .. } => None,
        }
    }
}
