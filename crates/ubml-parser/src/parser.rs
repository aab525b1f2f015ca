//! YAML parsing into located documents
//!
//! Parsing never panics and never returns `Err`: syntax problems come back as
//! diagnostics on a [`ParseOutcome`] with `ok == false`.

use ubml_core::{
    Diagnostic, DiagnosticCode, Document, DocumentMeta, Location, Scalar, Severity, Value,
};

use crate::detect::detect_document_type;
use crate::loader::{load, LoadError};

/// Filename used when the caller does not supply one
const ANONYMOUS: &str = "<input>";

/// Result of parsing one document
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub ok: bool,
    pub document: Option<Document>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl ParseOutcome {
    fn failed(error: Diagnostic) -> Self {
        Self {
            ok: false,
            document: None,
            errors: vec![error],
            warnings: Vec::new(),
        }
    }
}

/// Parse YAML text into a [`Document`]
///
/// `filename` is only used for document type detection and for attributing
/// diagnostics.
pub fn parse(text: &str, filename: Option<&str>) -> ParseOutcome {
    let file = filename.unwrap_or(ANONYMOUS);

    let loaded = match load(text) {
        Ok(loaded) => loaded,
        Err(e) => return ParseOutcome::failed(syntax_error(file, &e)),
    };

    let content = loaded.content.unwrap_or(Value::Scalar(Scalar::Null));
    let Value::Mapping(root) = &content else {
        let message = if matches!(content, Value::Scalar(Scalar::Null)) {
            "Document is empty".to_string()
        } else {
            format!("Document must be a mapping at the top level, found {}", content.type_name())
        };
        return ParseOutcome::failed(
            Diagnostic::new(DiagnosticCode::YamlSyntaxError, Severity::Error, message)
                .with_location(Location::with_position(file, 1, 1)),
        );
    };

    let mut warnings = Vec::new();

    let document_type = detect_document_type(filename, root);
    if document_type.is_none() {
        warnings.push(
            Diagnostic::new(
                DiagnosticCode::UnknownDocumentType,
                Severity::Warn,
                format!("Could not detect document type for '{}'", file),
            )
            .with_location(Location::new(file)),
        );
    }

    // Written form, so `ubml: 1.0` stays "1.0"
    let declared_version = match root.get("ubml") {
        Some(Value::Scalar(scalar)) if *scalar != Scalar::Null => {
            loaded.top_level_text.get("ubml").cloned()
        }
        _ => None,
    };

    tracing::trace!(file, tracked_paths = loaded.index.len(), "parsed document");

    let meta = DocumentMeta {
        declared_version,
        document_type,
        filename: file.to_string(),
    };

    ParseOutcome {
        ok: true,
        document: Some(Document::new(content, meta, loaded.index)),
        errors: Vec::new(),
        warnings,
    }
}

fn syntax_error(file: &str, error: &LoadError) -> Diagnostic {
    Diagnostic::new(
        DiagnosticCode::YamlSyntaxError,
        Severity::Error,
        format!("Invalid YAML: {}", error.message),
    )
    .with_location(Location::at(file, Some(error.location)))
}
