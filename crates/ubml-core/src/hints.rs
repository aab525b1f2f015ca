//! Schema-declared hint metadata
//!
//! Schemas can annotate properties with human-readable explanations. The
//! schema registry collects them into a [`HintCatalog`] once at load time and
//! the enhancement layer looks them up by literal key.
//!
//! Enum mistakes, nesting hints and property examples are scoped to the schema
//! object that declares them. Their key starts with that object's location,
//! written `<schema id>#<json pointer>`. Pattern explanations are keyed by the
//! regex alone, since the same regex means the same thing everywhere.

use std::collections::BTreeMap;

/// Explanation of a `pattern` constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternHint {
    /// The regex exactly as written in the schema
    pub pattern: String,

    /// What the pattern means, in words
    pub description: String,

    /// A value that matches
    pub example: Option<String>,
}

/// A property that belongs somewhere else
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestingHint {
    /// Misplaced property name
    pub property: String,

    /// Where it should live
    pub parent: String,

    /// Literal YAML showing the correct nesting
    pub example: String,
}

/// Location of a schema object, `<schema id>#<json pointer>`
pub fn schema_location(schema_id: &str, pointer: &str) -> String {
    format!("{}#{}", schema_id, pointer)
}

type Scoped = (String, String);

fn scoped(location: &str, key: &str) -> Scoped {
    (location.to_string(), key.to_string())
}

/// Lookup tables of schema-declared hints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HintCatalog {
    patterns: BTreeMap<String, PatternHint>,
    enum_mistakes: BTreeMap<Scoped, String>,
    nesting: BTreeMap<Scoped, NestingHint>,
    property_examples: BTreeMap<Scoped, String>,
}

impl HintCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pattern(&mut self, hint: PatternHint) {
        self.patterns.entry(hint.pattern.clone()).or_insert(hint);
    }

    /// Register a hint for a commonly mistyped value of the enum at `location`
    pub fn add_enum_mistake(&mut self, location: &str, value: &str, hint: impl Into<String>) {
        self.enum_mistakes
            .entry(scoped(location, value))
            .or_insert_with(|| hint.into());
    }

    /// Register a nesting hint for the object at `location`
    pub fn add_nesting(&mut self, location: &str, hint: NestingHint) {
        self.nesting
            .entry(scoped(location, &hint.property))
            .or_insert(hint);
    }

    /// Register a usage example for a property of the object at `location`
    pub fn add_property_example(&mut self, location: &str, property: &str, example: impl Into<String>) {
        self.property_examples
            .entry(scoped(location, property))
            .or_insert_with(|| example.into());
    }

    pub fn pattern(&self, pattern: &str) -> Option<&PatternHint> {
        self.patterns.get(pattern)
    }

    pub fn enum_mistake(&self, location: &str, value: &str) -> Option<&str> {
        self.enum_mistakes
            .get(&scoped(location, value))
            .map(|s| s.as_str())
    }

    pub fn nesting(&self, location: &str, property: &str) -> Option<&NestingHint> {
        self.nesting.get(&scoped(location, property))
    }

    pub fn property_example(&self, location: &str, property: &str) -> Option<&str> {
        self.property_examples
            .get(&scoped(location, property))
            .map(|s| s.as_str())
    }

    /// Fold another catalog in; entries already present win
    pub fn merge(&mut self, other: HintCatalog) {
        for (k, v) in other.patterns {
            self.patterns.entry(k).or_insert(v);
        }
        for (k, v) in other.enum_mistakes {
            self.enum_mistakes.entry(k).or_insert(v);
        }
        for (k, v) in other.nesting {
            self.nesting.entry(k).or_insert(v);
        }
        for (k, v) in other.property_examples {
            self.property_examples.entry(k).or_insert(v);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
            && self.enum_mistakes.is_empty()
            && self.nesting.is_empty()
            && self.property_examples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIND: &str = "urn:process#/properties/kind";

    #[test]
    fn first_registration_wins() {
        let mut catalog = HintCatalog::new();
        catalog.add_enum_mistake(KIND, "task", "Use 'action' for work items");
        catalog.add_enum_mistake(KIND, "task", "something else");
        assert_eq!(catalog.enum_mistake(KIND, "task"), Some("Use 'action' for work items"));
        assert_eq!(catalog.enum_mistake(KIND, "other"), None);
    }

    #[test]
    fn entries_are_scoped_to_their_location() {
        let mut catalog = HintCatalog::new();
        catalog.add_enum_mistake(KIND, "task", "Use 'action' for work items");
        catalog.add_property_example("urn:process#", "name", "name: Order intake");

        assert_eq!(catalog.enum_mistake("urn:actors#/properties/kind", "task"), None);
        assert_eq!(catalog.property_example("urn:actors#", "name"), None);
        assert_eq!(catalog.property_example("urn:process#", "name"), Some("name: Order intake"));
    }

    #[test]
    fn merge_keeps_existing() {
        let mut a = HintCatalog::new();
        a.add_property_example("urn:p#", "name", "name: Order intake");
        let mut b = HintCatalog::new();
        b.add_property_example("urn:p#", "name", "name: other");
        b.add_property_example("urn:p#", "steps", "steps: {}");
        a.merge(b);
        assert_eq!(a.property_example("urn:p#", "name"), Some("name: Order intake"));
        assert_eq!(a.property_example("urn:p#", "steps"), Some("steps: {}"));
        assert!(!a.is_empty());
    }

    #[test]
    fn location_format() {
        assert_eq!(schema_location("urn:p", ""), "urn:p#");
        assert_eq!(schema_location("urn:p", "/$defs/actor"), "urn:p#/$defs/actor");
    }
}
