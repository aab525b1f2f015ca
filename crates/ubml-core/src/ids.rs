//! Typed element identifiers
//!
//! Identifiers look like `AC00001`: a 2-3 letter uppercase prefix naming the
//! element type followed by a zero-padded number. The minimum digit width is
//! a workspace-wide setting.

use serde::{Deserialize, Serialize};

/// Default number of digits in an identifier
pub const DEFAULT_ID_DIGITS: usize = 5;

/// Element type named by an identifier prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementType {
    Actor,
    Persona,
    Skill,
    Resource,
    Equipment,
    Entity,
    Document,
    Location,
    Process,
    Step,
    Block,
    Phase,
    Metric,
    Hypothesis,
    Scenario,
    ValueStream,
    Capability,
    Product,
    Service,
    Portfolio,
    View,
}

impl ElementType {
    pub const ALL: [ElementType; 21] = [
        Self::Actor,
        Self::Persona,
        Self::Skill,
        Self::Resource,
        Self::Equipment,
        Self::Entity,
        Self::Document,
        Self::Location,
        Self::Process,
        Self::Step,
        Self::Block,
        Self::Phase,
        Self::Metric,
        Self::Hypothesis,
        Self::Scenario,
        Self::ValueStream,
        Self::Capability,
        Self::Product,
        Self::Service,
        Self::Portfolio,
        Self::View,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Actor => "AC",
            Self::Persona => "PS",
            Self::Skill => "SK",
            Self::Resource => "RS",
            Self::Equipment => "EQ",
            Self::Entity => "EN",
            Self::Document => "DC",
            Self::Location => "LC",
            Self::Process => "PR",
            Self::Step => "ST",
            Self::Block => "BK",
            Self::Phase => "PH",
            Self::Metric => "KP",
            Self::Hypothesis => "HY",
            Self::Scenario => "SC",
            Self::ValueStream => "VS",
            Self::Capability => "CAP",
            Self::Product => "PRD",
            Self::Service => "SVC",
            Self::Portfolio => "PF",
            Self::View => "VW",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.prefix() == prefix)
    }

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            Self::Actor => "actor",
            Self::Persona => "persona",
            Self::Skill => "skill",
            Self::Resource => "resource",
            Self::Equipment => "equipment",
            Self::Entity => "entity",
            Self::Document => "document",
            Self::Location => "location",
            Self::Process => "process",
            Self::Step => "step",
            Self::Block => "block",
            Self::Phase => "phase",
            Self::Metric => "metric",
            Self::Hypothesis => "hypothesis",
            Self::Scenario => "scenario",
            Self::ValueStream => "value stream",
            Self::Capability => "capability",
            Self::Product => "product",
            Self::Service => "service",
            Self::Portfolio => "portfolio",
            Self::View => "view",
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label(), self.prefix())
    }
}

/// A syntactically well-formed identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier<'a> {
    pub raw: &'a str,
    pub prefix: &'a str,
    pub digits: &'a str,
}

impl<'a> Identifier<'a> {
    /// Split `raw` into prefix and digits if it has identifier shape
    pub fn parse(raw: &'a str) -> Option<Self> {
        let split = raw.find(|c: char| !c.is_ascii_uppercase())?;
        let (prefix, digits) = raw.split_at(split);
        if !(2..=3).contains(&prefix.len()) {
            return None;
        }
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self { raw, prefix, digits })
    }

    pub fn element_type(&self) -> Option<ElementType> {
        ElementType::from_prefix(self.prefix)
    }
}

/// Workspace identifier format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdFormat {
    /// Minimum number of digits after the prefix
    pub digits: usize,
}

impl Default for IdFormat {
    fn default() -> Self {
        Self {
            digits: DEFAULT_ID_DIGITS,
        }
    }
}

impl IdFormat {
    pub fn new(digits: usize) -> Self {
        Self { digits }
    }

    /// Parse a string that may be used to *define* an element
    ///
    /// Requires a known prefix and at least the configured number of digits.
    pub fn parse_definition<'a>(&self, raw: &'a str) -> Option<(Identifier<'a>, ElementType)> {
        let id = Identifier::parse(raw)?;
        let element_type = id.element_type()?;
        if id.digits.len() < self.digits {
            return None;
        }
        Some((id, element_type))
    }

    /// Format a number as an identifier of the given type
    pub fn format(&self, element_type: ElementType, number: u64) -> String {
        format!("{}{:0width$}", element_type.prefix(), number, width = self.digits)
    }
}
