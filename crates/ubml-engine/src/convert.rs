//! Conversion of enhanced findings into diagnostics

use ubml_core::{
    Diagnostic, Document, FindingParams, Location, RawValidationFinding, ReferenceFinding,
    ReferenceFindingKind,
};
use ubml_enhance::EnhancedDiagnostic;

/// Diagnostic for a schema finding in `document`
pub fn schema_diagnostic(
    document: &Document,
    finding: &RawValidationFinding,
    enhanced: EnhancedDiagnostic,
) -> Diagnostic {
    let code = finding.keyword.code();
    let location = Location::at(
        document.filename(),
        document.source_location(&finding.instance_path),
    );

    let mut diag = Diagnostic::new(code, code.default_severity(), enhanced.message.clone())
        .with_path(finding.instance_path.clone())
        .with_location(location);

    if let (FindingParams::Type { expected }, Some(actual)) = (&finding.params, &finding.data) {
        diag = diag.with_comparison(expected.join(" or "), actual.to_string());
    }

    attach(diag, enhanced)
}

/// Diagnostic for a cross-document finding
pub fn reference_diagnostic(finding: &ReferenceFinding, enhanced: EnhancedDiagnostic) -> Diagnostic {
    let code = finding.code();
    let site = &finding.site;

    let mut diag = Diagnostic::new(code, code.default_severity(), enhanced.message.clone())
        .with_path(site.path.clone())
        .with_location(Location::at(site.file.clone(), site.location));

    if let ReferenceFindingKind::DuplicateId { first, .. } = &finding.kind {
        diag = diag.with_related(Location::at(first.file.clone(), first.location));
    }

    attach(diag, enhanced)
}

fn attach(mut diag: Diagnostic, enhanced: EnhancedDiagnostic) -> Diagnostic {
    diag.suggestion = enhanced.suggestion;
    diag.hint = enhanced.hint;
    diag.example = enhanced.example;
    diag.valid_options = enhanced.valid_options;
    diag
}

#[cfg(test)]
mod tests {
    use super::*;
    use ubml_core::{DiagnosticCode, Keyword, Severity, SiteRef, SourceLocation};

    #[test]
    fn duplicate_carries_both_locations() {
        let finding = ReferenceFinding {
            kind: ReferenceFindingKind::DuplicateId {
                id: "AC00001".into(),
                first: SiteRef {
                    file: "a.actors.ubml.yaml".into(),
                    path: "/actors/AC00001".into(),
                    location: Some(SourceLocation::new(3, 5)),
                },
            },
            site: SiteRef {
                file: "b.actors.ubml.yaml".into(),
                path: "/actors/AC00001".into(),
                location: Some(SourceLocation::new(3, 5)),
            },
        };
        let diag = reference_diagnostic(&finding, EnhancedDiagnostic::new("dup"));
        assert_eq!(diag.code, DiagnosticCode::DuplicateId);
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.file(), Some("b.actors.ubml.yaml"));
        assert_eq!(diag.related.len(), 1);
        assert_eq!(diag.related[0].to_string(), "a.actors.ubml.yaml:3:5");
    }

    #[test]
    fn schema_finding_located_in_document() {
        let outcome = ubml_parser::parse("processes:\n  PR00001:\n    tags: urgent\n", Some("p.process.ubml.yaml"));
        let document = outcome.document.unwrap();
        let finding = RawValidationFinding {
            keyword: Keyword::Type,
            instance_path: "/processes/PR00001/tags".into(),
            schema_path: "/properties/tags/type".into(),
            params: FindingParams::Type { expected: vec!["array".into()] },
            data: Some(serde_json::json!("urgent")),
        };
        let mut enhanced = EnhancedDiagnostic::new("Expected array");
        enhanced.suggestion = Some("wrap it".into());

        let diag = schema_diagnostic(&document, &finding, enhanced);
        assert_eq!(diag.code, DiagnosticCode::SchemaType);
        assert_eq!(diag.location.as_ref().unwrap().line, Some(3));
        assert_eq!(diag.expected.as_deref(), Some("array"));
        assert_eq!(diag.actual.as_deref(), Some("\"urgent\""));
        assert_eq!(diag.suggestion.as_deref(), Some("wrap it"));
    }
}
