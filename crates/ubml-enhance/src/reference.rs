//! Enhancement of cross-document reference findings

use ubml_core::{ElementType, Identifier, Location, ReferenceFinding, ReferenceFindingKind};

use crate::distance::closest_match;
use crate::schema::EnhancedDiagnostic;

/// Enhance a reference finding
///
/// `defined_ids` is every identifier defined in the run; it feeds the
/// "did you mean" and "next free number" suggestions.
pub fn enhance_reference(finding: &ReferenceFinding, defined_ids: &[String]) -> EnhancedDiagnostic {
    match &finding.kind {
        ReferenceFindingKind::UndefinedReference { id, property } => {
            let mut diag = EnhancedDiagnostic::new(format!(
                "'{}' references '{}', which is not defined in any document",
                property, id
            ));
            match Identifier::parse(id).and_then(|i| i.element_type().map(|t| (i, t))) {
                Some((parsed, element_type)) => {
                    let same_prefix = defined_ids
                        .iter()
                        .filter(|d| Identifier::parse(d).is_some_and(|i| i.prefix == parsed.prefix));
                    if let Some(best) = closest_match(id, same_prefix) {
                        diag.suggestion = Some(format!("Did you mean '{}'?", best));
                    }
                    diag.hint = Some(format!(
                        "Define {} '{}' or point '{}' at an existing one",
                        element_type.label(),
                        id,
                        property
                    ));
                }
                None => {
                    diag.hint = Some(format!("'{}' does not start with a known element prefix", id));
                    diag.valid_options = ElementType::ALL.iter().map(|t| t.to_string()).collect();
                }
            }
            diag
        }
        ReferenceFindingKind::WrongReferenceType {
            id,
            property,
            actual,
            expected,
        } => {
            let wanted: Vec<&str> = expected.iter().map(|t| t.label()).collect();
            let mut diag = EnhancedDiagnostic::new(format!(
                "'{}' must reference {}, but '{}' is of type {}",
                property,
                wanted.join(" or "),
                id,
                actual.label()
            ));
            let prefixes: Vec<&str> = expected.iter().map(|t| t.prefix()).collect();
            diag.hint = Some(format!(
                "Use an identifier starting with {}",
                prefixes.join(" or ")
            ));
            diag.valid_options = expected.iter().map(|t| t.to_string()).collect();
            diag
        }
        ReferenceFindingKind::DuplicateId { id, first } => {
            let first_location = Location::at(first.file.clone(), first.location);
            let mut diag = EnhancedDiagnostic::new(format!(
                "Duplicate identifier '{}', first defined at {}",
                id, first_location
            ));
            diag.hint = Some("Identifiers must be unique across the workspace".to_string());
            if let Some(next) = next_free_id(id, defined_ids) {
                diag.suggestion = Some(format!("Renumber this element, e.g. '{}'", next));
            }
            diag
        }
        ReferenceFindingKind::UnusedId { id, element_type } => {
            let mut diag = EnhancedDiagnostic::new(format!(
                "Identifier '{}' ({}) is defined but never referenced",
                id,
                element_type.label()
            ));
            diag.hint = Some("Reference it from another element or remove it".to_string());
            diag
        }
        ReferenceFindingKind::SingletonViolation {
            document_type,
            first_file,
        } => {
            let mut diag = EnhancedDiagnostic::new(format!(
                "Only one {} document is allowed per workspace (first: {})",
                document_type, first_file
            ));
            diag.suggestion = Some(format!("Merge this document into {}", first_file));
            diag
        }
        ReferenceFindingKind::HierarchyCycle { cycle } => {
            let mut path = cycle.clone();
            if let Some(first) = cycle.first() {
                path.push(first.clone());
            }
            let mut diag =
                EnhancedDiagnostic::new(format!("Hierarchy cycle: {}", path.join(" -> ")));
            diag.hint = Some(
                "Parent and children links must form a tree; remove one of the links".to_string(),
            );
            diag
        }
    }
}

/// One above the highest number in use for `id`'s prefix
fn next_free_id(id: &str, defined_ids: &[String]) -> Option<String> {
    let parsed = Identifier::parse(id)?;
    let highest = defined_ids
        .iter()
        .filter_map(|d| Identifier::parse(d))
        .filter(|d| d.prefix == parsed.prefix)
        .filter_map(|d| d.digits.parse::<u64>().ok())
        .max()?;
    Some(format!(
        "{}{:0width$}",
        parsed.prefix,
        highest + 1,
        width = parsed.digits.len()
    ))
}
