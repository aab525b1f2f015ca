//! Semantic validation across a whole UBML workspace
//!
//! This crate handles:
//! - Recording which identifiers are defined, and where
//! - Recording every reference and checking it resolves to the right type
//! - Duplicate, unused and singleton-document checks
//! - Parent/children hierarchy cycle detection
//!
//! Validation is two-pass: every definition in every document is collected
//! before any reference is checked.

pub mod fields;
pub mod registry;
pub mod hierarchy;
pub mod validator;

pub use fields::{DocumentMultiplicity, FieldSpec, HierarchyRole, ReferenceFieldRegistry};
pub use registry::{Definition, IdentifierRegistry, Reference};
pub use hierarchy::HierarchyGraph;
pub use validator::{ReferenceOptions, ReferenceReport, ReferenceValidator};
