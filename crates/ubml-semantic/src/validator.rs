//! Two-pass reference validation
//!
//! 1. Definition pass: every document, every identifier-shaped mapping key.
//! 2. Reference pass: every value of a reference field inside a defined
//!    element, checked against the complete set of definitions from pass 1.
//!
//! Then unused identifiers, single-instance documents and hierarchy cycles.
//!
//! Documents are processed in the order the caller supplies. That order only
//! decides which copy of a duplicated identifier is reported as the
//! duplicate; every other finding is order independent.

use serde::Serialize;
use ubml_core::{
    pointer_join, Document, IdFormat, Identifier, ReferenceFinding, ReferenceFindingKind,
    SiteRef, Value,
};

use crate::fields::{DocumentMultiplicity, HierarchyRole, ReferenceFieldRegistry};
use crate::hierarchy::HierarchyGraph;
use crate::registry::{Definition, IdentifierRegistry, Reference};

/// Per-run options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceOptions {
    /// Skip the unused-identifier warnings
    pub suppress_unused_warnings: bool,

    pub id_format: IdFormat,
}

/// Outcome of a reference validation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferenceReport {
    pub valid: bool,
    pub errors: Vec<ReferenceFinding>,
    pub warnings: Vec<ReferenceFinding>,

    /// Every defined identifier, in definition order
    pub defined_ids: Vec<String>,
}

/// Validates references across a set of documents
#[derive(Debug, Clone, Copy)]
pub struct ReferenceValidator<'a> {
    fields: &'a ReferenceFieldRegistry,
    multiplicity: &'a DocumentMultiplicity,
}

impl<'a> ReferenceValidator<'a> {
    pub fn new(fields: &'a ReferenceFieldRegistry, multiplicity: &'a DocumentMultiplicity) -> Self {
        Self { fields, multiplicity }
    }

    /// Validate the whole document set
    ///
    /// All documents must be present: this is not an incremental check.
    pub fn validate(&self, documents: &[Document], options: &ReferenceOptions) -> ReferenceReport {
        let mut registry = IdentifierRegistry::new();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        errors.extend(self.definition_pass(documents, &options.id_format, &mut registry));
        tracing::debug!(defined = registry.defined_count(), "definition pass complete");

        let mut hierarchy = HierarchyGraph::new();
        errors.extend(self.reference_pass(documents, &options.id_format, &mut registry, &mut hierarchy));
        tracing::debug!(references = registry.reference_count(), "reference pass complete");

        if !options.suppress_unused_warnings {
            warnings.extend(unused_identifiers(&registry));
        }

        errors.extend(self.multiplicity_check(documents));
        errors.extend(hierarchy_cycles(&hierarchy, &registry));

        ReferenceReport {
            valid: errors.is_empty(),
            errors,
            warnings,
            defined_ids: registry.defined_ids(),
        }
    }

    /// Pass 1: record every definition, reporting duplicates
    fn definition_pass(
        &self,
        documents: &[Document],
        format: &IdFormat,
        registry: &mut IdentifierRegistry,
    ) -> Vec<ReferenceFinding> {
        let mut duplicates = Vec::new();
        for document in documents {
            self.collect_definitions(document, &document.content, "", false, format, registry, &mut duplicates);
        }
        duplicates
    }

    fn collect_definitions(
        &self,
        document: &Document,
        value: &Value,
        path: &str,
        in_element: bool,
        format: &IdFormat,
        registry: &mut IdentifierRegistry,
        duplicates: &mut Vec<ReferenceFinding>,
    ) {
        match value {
            Value::Mapping(mapping) => {
                for (key, child) in mapping.iter() {
                    // Keys under a reference field are references, not definitions
                    if in_element && self.fields.get(key).is_some() {
                        continue;
                    }
                    let child_path = pointer_join(path, key);
                    let defined_type = format.parse_definition(key).map(|(_, t)| t);

                    if let Some(element_type) = defined_type {
                        let definition = Definition {
                            id: key.to_string(),
                            element_type,
                            site: site(document, &child_path),
                        };
                        if let Err(first) = registry.define(definition) {
                            duplicates.push(ReferenceFinding {
                                kind: ReferenceFindingKind::DuplicateId {
                                    id: key.to_string(),
                                    first: first.site.clone(),
                                },
                                site: site(document, &child_path),
                            });
                        }
                    }

                    let child_in_element = in_element || defined_type.is_some();
                    self.collect_definitions(
                        document,
                        child,
                        &child_path,
                        child_in_element,
                        format,
                        registry,
                        duplicates,
                    );
                }
            }
            Value::Sequence(items) => {
                for (index, item) in items.iter().enumerate() {
                    let child_path = format!("{}/{}", path, index);
                    self.collect_definitions(
                        document, item, &child_path, in_element, format, registry, duplicates,
                    );
                }
            }
            Value::Scalar(_) => {}
        }
    }

    /// Pass 2: record and check every reference
    fn reference_pass(
        &self,
        documents: &[Document],
        format: &IdFormat,
        registry: &mut IdentifierRegistry,
        hierarchy: &mut HierarchyGraph,
    ) -> Vec<ReferenceFinding> {
        let mut findings = Vec::new();
        for document in documents {
            let mut walk = ReferenceWalk {
                fields: self.fields,
                format,
                document,
                registry: &mut *registry,
                hierarchy: &mut *hierarchy,
                findings: &mut findings,
            };
            walk.visit(&document.content, "", None);
        }
        findings
    }

    /// More than one document of a single-instance type
    fn multiplicity_check(&self, documents: &[Document]) -> Vec<ReferenceFinding> {
        let mut findings = Vec::new();
        for document_type in self.multiplicity.singletons() {
            let mut of_type = documents
                .iter()
                .filter(|d| d.meta.document_type == Some(document_type));
            let Some(first) = of_type.next() else {
                continue;
            };
            for extra in of_type {
                findings.push(ReferenceFinding {
                    kind: ReferenceFindingKind::SingletonViolation {
                        document_type,
                        first_file: first.filename().to_string(),
                    },
                    site: site(extra, ""),
                });
            }
        }
        findings
    }
}

/// Reference-pass traversal state for one document
struct ReferenceWalk<'w> {
    fields: &'w ReferenceFieldRegistry,
    format: &'w IdFormat,
    document: &'w Document,
    registry: &'w mut IdentifierRegistry,
    hierarchy: &'w mut HierarchyGraph,
    findings: &'w mut Vec<ReferenceFinding>,
}

impl ReferenceWalk<'_> {
    /// `owner` is the nearest enclosing defined element
    fn visit(&mut self, value: &Value, path: &str, owner: Option<&str>) {
        match value {
            Value::Mapping(mapping) => {
                for (key, child) in mapping.iter() {
                    let child_path = pointer_join(path, key);

                    // Outside any element the same names are section keys
                    if owner.is_some() && self.fields.get(key).is_some() {
                        self.check_field(key, child, &child_path, owner);
                        continue;
                    }

                    let child_owner = if self.format.parse_definition(key).is_some() {
                        Some(key)
                    } else {
                        owner
                    };
                    self.visit(child, &child_path, child_owner);
                }
            }
            Value::Sequence(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.visit(item, &format!("{}/{}", path, index), owner);
                }
            }
            Value::Scalar(_) => {}
        }
    }

    fn check_field(&mut self, property: &str, value: &Value, path: &str, owner: Option<&str>) {
        match value {
            Value::Sequence(items) => {
                for (index, item) in items.iter().enumerate() {
                    if let Some(id) = item.as_str() {
                        self.check_reference(property, id, &format!("{}/{}", path, index), owner);
                    }
                }
            }
            other => {
                if let Some(id) = other.as_str() {
                    self.check_reference(property, id, path, owner);
                }
            }
        }
    }

    fn check_reference(&mut self, property: &str, raw: &str, path: &str, owner: Option<&str>) {
        let id = raw.trim();
        // Free text in a reference field is left to the schema
        if Identifier::parse(id).is_none() {
            return;
        }
        let Some(spec) = self.fields.get(property) else {
            return;
        };

        let site = site(self.document, path);
        self.registry.record_reference(Reference {
            id: id.to_string(),
            property: property.to_string(),
            site: site.clone(),
        });

        let Some(definition) = self.registry.definition(id) else {
            self.findings.push(ReferenceFinding {
                kind: ReferenceFindingKind::UndefinedReference {
                    id: id.to_string(),
                    property: property.to_string(),
                },
                site,
            });
            return;
        };

        if !spec.accepts(definition.element_type) {
            self.findings.push(ReferenceFinding {
                kind: ReferenceFindingKind::WrongReferenceType {
                    id: id.to_string(),
                    property: property.to_string(),
                    actual: definition.element_type,
                    expected: spec.expected.clone(),
                },
                site,
            });
            return;
        }

        if let (Some(role), Some(owner)) = (spec.hierarchy, owner) {
            match role {
                HierarchyRole::Parent => self.hierarchy.add_edge(owner, id),
                HierarchyRole::Children => self.hierarchy.add_edge(id, owner),
            }
        }
    }
}

fn site(document: &Document, path: &str) -> SiteRef {
    SiteRef {
        file: document.filename().to_string(),
        path: path.to_string(),
        location: document.source_location(path),
    }
}

/// Pass 3: identifiers nobody references
fn unused_identifiers(registry: &IdentifierRegistry) -> Vec<ReferenceFinding> {
    registry
        .definitions()
        .filter(|d| registry.references_to(&d.id).is_empty())
        .map(|d| ReferenceFinding {
            kind: ReferenceFindingKind::UnusedId {
                id: d.id.clone(),
                element_type: d.element_type,
            },
            site: d.site.clone(),
        })
        .collect()
}

fn hierarchy_cycles(hierarchy: &HierarchyGraph, registry: &IdentifierRegistry) -> Vec<ReferenceFinding> {
    hierarchy
        .cycles()
        .into_iter()
        .filter_map(|cycle| {
            let first = registry.definition(cycle.first()?)?;
            Some(ReferenceFinding {
                site: first.site.clone(),
                kind: ReferenceFindingKind::HierarchyCycle { cycle },
            })
        })
        .collect()
}
