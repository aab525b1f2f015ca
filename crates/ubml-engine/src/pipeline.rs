//! The validation pipeline
//!
//! Every document is parsed and schema-checked on its own. Reference
//! validation only starts once all documents are parsed, since it needs the
//! whole set.

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use ubml_core::{Config, Diagnostic, Document, ValidationResult};
use ubml_enhance::{enhance_reference, Enhancer};
use ubml_schema::{SchemaError, SchemaRegistry, SchemaValidator};
use ubml_semantic::{DocumentMultiplicity, ReferenceFieldRegistry, ReferenceOptions, ReferenceValidator};

use crate::convert::{reference_diagnostic, schema_diagnostic};

/// One input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    /// Path as it should appear in diagnostics
    pub path: String,
    pub text: String,
}

impl SourceText {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Read a file from disk
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

/// Problems with the tooling setup, as opposed to problems in documents
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Schema configuration error: {0}")]
    Schema(#[from] SchemaError),
}

/// Validates a set of UBML documents
///
/// Holds its configuration by value and a snapshot of the schema registry,
/// so one engine can serve many runs without state leaking between them.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    registry: Arc<SchemaRegistry>,
    fields: ReferenceFieldRegistry,
    multiplicity: DocumentMultiplicity,
    config: Config,
}

impl ValidationEngine {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        fields: ReferenceFieldRegistry,
        multiplicity: DocumentMultiplicity,
        config: Config,
    ) -> Self {
        Self {
            registry,
            fields,
            multiplicity,
            config,
        }
    }

    /// Engine with the built-in reference fields and singleton rules
    pub fn with_builtin_rules(registry: Arc<SchemaRegistry>, config: Config) -> Self {
        Self::new(
            registry,
            ReferenceFieldRegistry::builtin(),
            DocumentMultiplicity::builtin(),
            config,
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Validate a complete set of documents
    ///
    /// Document problems end up in the result. `Err` means the run itself
    /// could not proceed, e.g. a document type with no registered schema.
    pub fn validate(&self, sources: &[SourceText]) -> Result<ValidationResult, EngineError> {
        let mut diagnostics = Vec::new();
        let mut documents = Vec::new();

        for source in sources {
            if self.config.is_ignored(&source.path) {
                tracing::debug!(file = %source.path, "skipping ignored file");
                continue;
            }

            let outcome = ubml_parser::parse(&source.text, Some(&source.path));
            diagnostics.extend(outcome.errors);
            diagnostics.extend(outcome.warnings);

            if let Some(document) = outcome.document {
                diagnostics.extend(self.check_schema(&document)?);
                documents.push(document);
            }
        }

        tracing::debug!(documents = documents.len(), "parsed and schema-checked");
        diagnostics.extend(self.check_references(&documents));

        for diagnostic in &mut diagnostics {
            diagnostic.severity = self
                .config
                .severity
                .get_severity(diagnostic.code, diagnostic.severity);
        }

        let result = ValidationResult::from_diagnostics(diagnostics, self.config.validation.strict);
        tracing::debug!(
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "validation finished"
        );
        Ok(result)
    }

    /// Structural diagnostics for one document
    ///
    /// Documents without a detected type have no schema to check against.
    fn check_schema(&self, document: &Document) -> Result<Vec<Diagnostic>, EngineError> {
        let Some(document_type) = document.meta.document_type else {
            return Ok(Vec::new());
        };

        let validator = SchemaValidator::new(&self.registry);
        let enhancer = Enhancer::new(self.registry.hints());

        let findings = validator.validate(&document.content, document_type)?;
        Ok(findings
            .iter()
            .map(|finding| {
                let context = validator.context_for(document_type, finding);
                let enhanced = enhancer.enhance(finding, Some(&context));
                schema_diagnostic(document, finding, enhanced)
            })
            .collect())
    }

    fn check_references(&self, documents: &[Document]) -> Vec<Diagnostic> {
        let options = ReferenceOptions {
            suppress_unused_warnings: self.config.validation.suppress_unused_warnings,
            id_format: self.config.validation.id_format(),
        };
        let report = ReferenceValidator::new(&self.fields, &self.multiplicity).validate(documents, &options);

        report
            .errors
            .iter()
            .chain(report.warnings.iter())
            .map(|finding| reference_diagnostic(finding, enhance_reference(finding, &report.defined_ids)))
            .collect()
    }
}
