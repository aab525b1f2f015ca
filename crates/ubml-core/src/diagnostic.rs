//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Parse issues (1xxx)
    /// Document text is not valid YAML
    YamlSyntaxError,

    /// Document type could not be inferred from filename or content
    UnknownDocumentType,

    // Schema violations (2xxx)
    /// A required property is missing
    SchemaRequired,

    /// A value has the wrong type
    SchemaType,

    /// A value is not one of the allowed values
    SchemaEnum,

    /// A value does not match the required format
    SchemaPattern,

    /// A property is not declared by the schema
    SchemaUnknownProperty,

    /// Any other structural violation (combinators, bounds, ...)
    SchemaViolation,

    // Reference issues (3xxx)
    /// A reference points at an identifier nobody defines
    UndefinedReference,

    /// A reference points at an element of the wrong type
    WrongReferenceType,

    /// The same identifier is defined more than once
    DuplicateId,

    /// An identifier is defined but never referenced
    UnusedId,

    /// More than one document of a single-instance type
    SingletonViolation,

    /// Parent/children relations form a cycle
    HierarchyCycle,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::YamlSyntaxError => "YAML_SYNTAX_ERROR",
            Self::UnknownDocumentType => "UNKNOWN_DOCUMENT_TYPE",
            Self::SchemaRequired => "SCHEMA_REQUIRED",
            Self::SchemaType => "SCHEMA_TYPE",
            Self::SchemaEnum => "SCHEMA_ENUM",
            Self::SchemaPattern => "SCHEMA_PATTERN",
            Self::SchemaUnknownProperty => "SCHEMA_UNKNOWN_PROPERTY",
            Self::SchemaViolation => "SCHEMA_VIOLATION",
            Self::UndefinedReference => "UNDEFINED_REFERENCE",
            Self::WrongReferenceType => "WRONG_REFERENCE_TYPE",
            Self::DuplicateId => "DUPLICATE_ID",
            Self::UnusedId => "UNUSED_ID",
            Self::SingletonViolation => "SINGLETON_VIOLATION",
            Self::HierarchyCycle => "HIERARCHY_CYCLE",
        }
    }

    /// Severity a finding with this code carries before any overrides
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::UnknownDocumentType | Self::UnusedId => Severity::Warn,
            _ => Severity::Error,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - should be reviewed but not blocking
    Warn,

    /// Error - blocking issue that should fail CI
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path as given by the caller
    pub file: String,

    /// Optional line number (1-indexed)
    pub line: Option<usize>,

    /// Optional column number (1-indexed)
    pub column: Option<usize>,
}

impl Location {
    /// Create a new location with just a file path
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            column: None,
        }
    }

    /// Create a location with file, line, and column
    pub fn with_position(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    /// Create a location from a file and an optional resolved position
    pub fn at(file: impl Into<String>, position: Option<crate::SourceLocation>) -> Self {
        match position {
            Some(pos) => Self::with_position(file, pos.line, pos.column),
            None => Self::new(file),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "{}:{}:{}", self.file, line, column),
            (Some(line), None) => write!(f, "{}:{}", self.file, line),
            _ => write!(f, "{}", self.file),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Structural path inside the document (JSON pointer form)
    pub path: String,

    /// Source location (best-effort)
    pub location: Option<Location>,

    /// Expected value (for comparison diagnostics)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    /// Actual value (for comparison diagnostics)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,

    /// "Did you mean" style replacement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Explanation of what went wrong
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    /// Canonical usage example
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,

    /// Every value that would have been accepted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub valid_options: Vec<String>,

    /// Other places involved in the same finding
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<Location>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            path: String::new(),
            location: None,
            expected: None,
            actual: None,
            suggestion: None,
            hint: None,
            example: None,
            valid_options: Vec::new(),
            related: Vec::new(),
        }
    }

    /// Set the structural path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set expected/actual values
    pub fn with_comparison(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }

    /// Add a related location
    pub fn with_related(mut self, location: Location) -> Self {
        self.related.push(location);
        self
    }

    /// File the diagnostic is attributed to, if any
    pub fn file(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.file.as_str())
    }
}
