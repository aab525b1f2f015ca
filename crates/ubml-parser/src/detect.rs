//! Document type detection
//!
//! The filename suffix wins (`<name>.<type>.ubml.yaml` or `<type>.ubml.yaml`).
//! Otherwise the first type whose signature keys appear at the top level is
//! used.

use ubml_core::{DocumentType, Mapping};

const SUFFIXES: [&str; 2] = [".ubml.yaml", ".ubml.yml"];

/// Detect type from the filename alone
pub fn detect_from_filename(filename: &str) -> Option<DocumentType> {
    let base = filename.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(filename);
    let stem = SUFFIXES.iter().find_map(|suffix| base.strip_suffix(suffix))?;
    let type_name = stem.rsplit('.').next().unwrap_or(stem);
    type_name.parse().ok()
}

/// Detect type from characteristic top-level keys
pub fn detect_from_content(root: &Mapping) -> Option<DocumentType> {
    DocumentType::ALL
        .iter()
        .copied()
        .find(|t| t.signature_keys().iter().any(|key| root.contains_key(key)))
}

/// Filename first, content second
pub fn detect_document_type(filename: Option<&str>, root: &Mapping) -> Option<DocumentType> {
    filename
        .and_then(detect_from_filename)
        .or_else(|| detect_from_content(root))
}
