//! Defined and referenced identifiers for one validation run

use std::collections::HashMap;
use ubml_core::{ElementType, SiteRef};

/// Where an identifier is defined
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub id: String,
    pub element_type: ElementType,
    pub site: SiteRef,
}

/// One occurrence of an identifier in a reference field
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub id: String,
    pub property: String,
    pub site: SiteRef,
}

/// Working state of a single validation run
///
/// Built fresh for every run. The first definition of an identifier is the
/// one references resolve to.
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    defined: HashMap<String, Definition>,
    definition_order: Vec<String>,
    referenced: HashMap<String, Vec<Reference>>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a definition
    ///
    /// Returns the existing definition, untouched, if the identifier was
    /// already defined.
    pub fn define(&mut self, definition: Definition) -> Result<(), &Definition> {
        if self.defined.contains_key(&definition.id) {
            return Err(&self.defined[&definition.id]);
        }
        self.definition_order.push(definition.id.clone());
        self.defined.insert(definition.id.clone(), definition);
        Ok(())
    }

    pub fn record_reference(&mut self, reference: Reference) {
        self.referenced
            .entry(reference.id.clone())
            .or_default()
            .push(reference);
    }

    pub fn definition(&self, id: &str) -> Option<&Definition> {
        self.defined.get(id)
    }

    pub fn references_to(&self, id: &str) -> &[Reference] {
        self.referenced.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Definitions in the order they were first seen
    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.definition_order
            .iter()
            .filter_map(|id| self.defined.get(id))
    }

    pub fn defined_ids(&self) -> Vec<String> {
        self.definition_order.clone()
    }

    pub fn defined_count(&self) -> usize {
        self.defined.len()
    }

    pub fn reference_count(&self) -> usize {
        self.referenced.values().map(Vec::len).sum()
    }
}
