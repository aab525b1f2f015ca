//! Static tables: which properties hold references, which documents are
//! single-instance
//!
//! Both are plain values built once and passed to the validator; nothing here
//! is global.

use std::collections::{BTreeMap, BTreeSet};
use ubml_core::{DocumentType, ElementType};

/// Role a reference field plays in the element hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyRole {
    /// Value is the owner's parent
    Parent,
    /// Values are the owner's children
    Children,
}

/// Description of one reference-carrying property
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldSpec {
    /// Element types the reference may point at; empty means any
    pub expected: Vec<ElementType>,

    pub hierarchy: Option<HierarchyRole>,
}

impl FieldSpec {
    pub fn accepts(&self, element_type: ElementType) -> bool {
        self.expected.is_empty() || self.expected.contains(&element_type)
    }
}

/// Closed set of property names that carry identifier references
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceFieldRegistry {
    fields: BTreeMap<String, FieldSpec>,
}

impl ReferenceFieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a reference field
    pub fn with_field(mut self, name: impl Into<String>, expected: &[ElementType]) -> Self {
        self.fields.insert(
            name.into(),
            FieldSpec {
                expected: expected.to_vec(),
                hierarchy: None,
            },
        );
        self
    }

    /// Declare a field that also defines the hierarchy
    pub fn with_hierarchy_field(mut self, name: impl Into<String>, role: HierarchyRole) -> Self {
        self.fields.insert(
            name.into(),
            FieldSpec {
                expected: Vec::new(),
                hierarchy: Some(role),
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// The reference fields of the UBML vocabulary
    pub fn builtin() -> Self {
        use ElementType::*;

        let people: &[ElementType] = &[Actor, Persona];
        let flow: &[ElementType] = &[Step, Block, Phase];
        let information: &[ElementType] = &[Entity, Document];

        Self::new()
            .with_field("responsible", people)
            .with_field("accountable", people)
            .with_field("consulted", people)
            .with_field("informed", people)
            .with_field("owner", people)
            .with_field("performer", people)
            .with_field("approver", people)
            .with_field("reportsTo", &[Actor])
            .with_field("from", flow)
            .with_field("to", flow)
            .with_field("inputs", information)
            .with_field("outputs", information)
            .with_field("skills", &[Skill])
            .with_field("resources", &[Resource])
            .with_field("equipment", &[Equipment])
            .with_field("location", &[Location])
            .with_field("locations", &[Location])
            .with_field("kpis", &[Metric])
            .with_field("process", &[Process])
            .with_field("calls", &[Process])
            .with_field("capabilities", &[Capability])
            .with_field("products", &[Product])
            .with_field("services", &[Service])
            .with_field("valueStream", &[ValueStream])
            .with_field("scenario", &[Scenario])
            .with_field("hypotheses", &[Hypothesis])
            .with_hierarchy_field("parent", HierarchyRole::Parent)
            .with_hierarchy_field("children", HierarchyRole::Children)
    }
}

/// How many documents of each type a workspace may hold
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMultiplicity {
    singletons: BTreeSet<DocumentType>,
}

impl DocumentMultiplicity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_singleton(mut self, document_type: DocumentType) -> Self {
        self.singletons.insert(document_type);
        self
    }

    pub fn is_singleton(&self, document_type: DocumentType) -> bool {
        self.singletons.contains(&document_type)
    }

    pub fn singletons(&self) -> impl Iterator<Item = DocumentType> + '_ {
        self.singletons.iter().copied()
    }

    /// One workspace and one glossary per workspace
    pub fn builtin() -> Self {
        Self::new()
            .with_singleton(DocumentType::Workspace)
            .with_singleton(DocumentType::Glossary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_fields() {
        let fields = ReferenceFieldRegistry::builtin();
        let responsible = fields.get("responsible").unwrap();
        assert!(responsible.accepts(ElementType::Actor));
        assert!(!responsible.accepts(ElementType::Entity));

        let parent = fields.get("parent").unwrap();
        assert_eq!(parent.hierarchy, Some(HierarchyRole::Parent));
        assert!(parent.accepts(ElementType::Process));

        assert!(fields.get("name").is_none());
    }

    #[test]
    fn singletons() {
        let multiplicity = DocumentMultiplicity::builtin();
        assert!(multiplicity.is_singleton(DocumentType::Workspace));
        assert!(!multiplicity.is_singleton(DocumentType::Process));
    }
}
