//! Integration tests for the full validation pipeline

use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;
use ubml_core::{Config, DiagnosticCode, Severity, ValidationResult};
use ubml_engine::{EngineError, SourceText, ValidationEngine};
use ubml_schema::{SchemaError, SchemaRegistry};

fn registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::from_dir(Path::new("tests/fixtures/schemas")).unwrap())
}

fn workspace() -> Vec<SourceText> {
    let dir = Path::new("tests/fixtures/workspace");
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    paths.sort();
    paths.iter().map(|p| SourceText::from_file(p).unwrap()).collect()
}

fn engine(config: Config) -> ValidationEngine {
    ValidationEngine::with_builtin_rules(registry(), config)
}

fn quiet() -> Config {
    let mut config = Config::default();
    config.validation.suppress_unused_warnings = true;
    config
}

fn codes(result: &ValidationResult) -> Vec<DiagnosticCode> {
    result.errors.iter().map(|d| d.code).collect()
}

fn replace(sources: &mut [SourceText], suffix: &str, from: &str, to: &str) {
    let source = sources.iter_mut().find(|s| s.path.ends_with(suffix)).unwrap();
    assert!(source.text.contains(from), "fixture {suffix} lacks {from:?}");
    source.text = source.text.replace(from, to);
}

#[test]
fn fixture_workspace_is_valid() {
    let result = engine(quiet()).validate(&workspace()).unwrap();
    assert!(result.valid, "{:#?}", result.errors);
    assert!(result.warnings.is_empty(), "{:#?}", result.warnings);
}

#[test]
fn unused_identifiers_are_warnings_only() {
    let result = engine(Config::default()).validate(&workspace()).unwrap();
    assert!(result.valid);

    let unused: Vec<&str> = result
        .warnings
        .iter()
        .filter(|d| d.code == DiagnosticCode::UnusedId)
        .map(|d| d.message.as_str())
        .collect();
    assert!(unused.iter().any(|m| m.contains("SK00001")), "{unused:?}");
    assert!(result.warnings.iter().all(|d| d.location.as_ref().and_then(|l| l.line).is_some()));
}

#[test]
fn strict_mode_promotes_warnings() {
    let mut config = Config::default();
    config.validation.strict = true;
    let result = engine(config).validate(&workspace()).unwrap();
    assert!(!result.valid);
    assert!(result.warnings.is_empty());
    assert!(result.errors.iter().all(|d| d.severity == Severity::Error));
}

#[test]
fn severity_override_applies_before_strict() {
    let mut config = Config::default();
    config.validation.strict = true;
    config.severity.set_override(DiagnosticCode::UnusedId, Severity::Info);
    let result = engine(config).validate(&workspace()).unwrap();
    assert!(result.valid, "{:#?}", result.errors);
    assert!(result.warnings.iter().all(|d| d.severity == Severity::Info));
}

#[test]
fn enum_typo_gets_suggestion_and_location() {
    let mut sources = workspace();
    replace(&mut sources, "intake.process.ubml.yaml", "kind: action", "kind: acton");

    let result = engine(quiet()).validate(&sources).unwrap();
    assert_eq!(codes(&result), vec![DiagnosticCode::SchemaEnum]);

    let diag = &result.errors[0];
    assert_eq!(diag.path, "/processes/PR00001/steps/ST00001/kind");
    assert_eq!(diag.suggestion.as_deref(), Some("Did you mean 'action'?"));
    assert_eq!(diag.valid_options, vec!["action", "milestone", "decision"]);

    let location = diag.location.as_ref().unwrap();
    assert!(location.file.ends_with("intake.process.ubml.yaml"));
    assert_eq!(location.line, Some(9));
}

#[test]
fn declared_mistake_hint_wins() {
    let mut sources = workspace();
    replace(&mut sources, "intake.process.ubml.yaml", "kind: action", "kind: task");

    let result = engine(quiet()).validate(&sources).unwrap();
    let diag = &result.errors[0];
    assert_eq!(diag.hint.as_deref(), Some("Work steps use kind: action"));
    assert_eq!(diag.suggestion, None);
}

#[test]
fn mistake_hint_stays_with_its_enum() {
    let mut sources = workspace();
    replace(
        &mut sources,
        "intake.process.ubml.yaml",
        "    name: Order intake",
        "    name: Order intake\n    status: task",
    );

    let result = engine(quiet()).validate(&sources).unwrap();
    assert_eq!(codes(&result), vec![DiagnosticCode::SchemaEnum]);
    let diag = &result.errors[0];
    assert_eq!(diag.path, "/processes/PR00001/status");
    assert_eq!(diag.hint, None);
    assert_eq!(diag.valid_options, vec!["draft", "review", "final"]);
}

#[test]
fn duration_without_unit() {
    let mut sources = workspace();
    replace(&mut sources, "intake.process.ubml.yaml", "duration: 15min", "duration: '15'");

    let result = engine(quiet()).validate(&sources).unwrap();
    assert_eq!(codes(&result), vec![DiagnosticCode::SchemaPattern]);
    let diag = &result.errors[0];
    assert_eq!(diag.example.as_deref(), Some("duration: 2h"));
    assert!(diag.suggestion.as_deref().unwrap().starts_with("Missing unit"));
}

#[test]
fn misspelled_property_suggests_valid_one() {
    let mut sources = workspace();
    replace(&mut sources, "intake.process.ubml.yaml", "    name: Order intake", "    nam: Order intake");

    let result = engine(quiet()).validate(&sources).unwrap();
    let unknown = result
        .errors
        .iter()
        .find(|d| d.code == DiagnosticCode::SchemaUnknownProperty)
        .unwrap();
    assert_eq!(unknown.suggestion.as_deref(), Some("Did you mean 'name'?"));
    assert!(unknown.valid_options.contains(&"steps".to_string()));
    assert!(codes(&result).contains(&DiagnosticCode::SchemaRequired));
}

#[test]
fn undefined_and_duplicate_references() {
    let mut sources = workspace();
    replace(&mut sources, "intake.process.ubml.yaml", "responsible: AC00002", "responsible: AC00003");
    sources.push(SourceText::new(
        "extra.actors.ubml.yaml",
        "actors:\n  AC00001:\n    name: Second clerk\n",
    ));

    let result = engine(quiet()).validate(&sources).unwrap();
    let mut found = codes(&result);
    found.sort_by_key(|c| c.as_str());
    assert_eq!(found, vec![DiagnosticCode::DuplicateId, DiagnosticCode::UndefinedReference]);

    let undefined = result
        .errors
        .iter()
        .find(|d| d.code == DiagnosticCode::UndefinedReference)
        .unwrap();
    assert!(undefined.message.contains("AC00003"));
    assert!(undefined.suggestion.is_some());

    let duplicate = result
        .errors
        .iter()
        .find(|d| d.code == DiagnosticCode::DuplicateId)
        .unwrap();
    assert_eq!(duplicate.file(), Some("extra.actors.ubml.yaml"));
    assert_eq!(duplicate.related.len(), 1);
    assert!(duplicate.related[0].file.ends_with("team.actors.ubml.yaml"));
}

#[test]
fn syntax_error_does_not_stop_other_documents() {
    let mut sources = workspace();
    sources.push(SourceText::new("broken.process.ubml.yaml", "processes:\n  PR00009: [unclosed\n"));

    let result = engine(quiet()).validate(&sources).unwrap();
    assert_eq!(codes(&result), vec![DiagnosticCode::YamlSyntaxError]);
    assert_eq!(result.errors[0].file(), Some("broken.process.ubml.yaml"));
}

#[test]
fn untyped_document_still_takes_part_in_references() {
    let mut sources = workspace();
    sources.push(SourceText::new(
        "notes.yaml",
        "remarks:\n  PR00002:\n    owner: AC00001\n",
    ));

    let result = engine(quiet()).validate(&sources).unwrap();
    assert!(result.valid, "{:#?}", result.errors);
    assert!(result.warnings.iter().any(|d| d.code == DiagnosticCode::UnknownDocumentType));
}

#[test]
fn ignored_files_are_skipped() {
    let mut sources = workspace();
    sources.push(SourceText::new("drafts/broken.process.ubml.yaml", "processes: [\n"));

    let mut config = quiet();
    config.ignore.files.push("drafts/*".to_string());
    let result = engine(config).validate(&sources).unwrap();
    assert!(result.valid, "{:#?}", result.errors);
}

#[test]
fn ignore_patterns_match_relative_to_project_root() {
    let mut sources = workspace();
    sources.push(SourceText::new(
        "tests/fixtures/models/archive/b.process.ubml.yaml",
        "processes: [\n",
    ));
    sources.push(SourceText::new("./tests/fixtures/drafts/a.process.ubml.yaml", "processes: [\n"));

    let mut config = quiet();
    config.project_root = "tests/fixtures".into();
    config.ignore.files = vec!["**/archive/*.ubml.yaml".to_string(), "drafts/*".to_string()];
    let result = engine(config).validate(&sources).unwrap();
    assert!(result.valid, "{:#?}", result.errors);
}

#[test]
fn missing_schema_is_fatal() {
    let sources = vec![SourceText::new("metrics.ubml.yaml", "kpis:\n  KP00001:\n    name: Cycle time\n")];
    let err = engine(quiet()).validate(&sources).unwrap_err();
    assert!(matches!(err, EngineError::Schema(SchemaError::MissingSchema(_))));
}

#[test]
fn second_workspace_document() {
    let mut sources = workspace();
    sources.push(SourceText::new("other.workspace.ubml.yaml", "organization: Acme Two\n"));

    let result = engine(quiet()).validate(&sources).unwrap();
    assert_eq!(codes(&result), vec![DiagnosticCode::SingletonViolation]);
    assert_eq!(result.errors[0].file(), Some("other.workspace.ubml.yaml"));
}
