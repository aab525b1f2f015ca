//! Error enhancement for UBML validation findings
//!
//! Raw findings from the schema and reference validators state facts. This
//! crate turns them into messages a person can act on: what is wrong, what
//! was probably meant, and an example of the right shape.
//!
//! Hints are resolved in a fixed order:
//! 1. literal lookups declared by the schema (common mistakes, nesting)
//! 2. structural heuristics ([`rules::PATTERN_RULES`])
//! 3. nearest match by edit distance ([`closest_match`])

pub mod distance;
pub mod reference;
pub mod rules;
pub mod schema;

pub use distance::closest_match;
pub use reference::enhance_reference;
pub use rules::{pattern_heuristic, PatternRule, PATTERN_RULES};
pub use schema::{EnhancedDiagnostic, Enhancer};
