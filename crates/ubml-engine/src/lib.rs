//! UBML validation engine
//!
//! Ties the stages together for a whole workspace:
//! - source-mapped parsing
//! - schema validation per document type
//! - cross-document reference validation
//! - error enhancement
//! - severity policy (overrides, strict mode)

pub mod convert;
pub mod pipeline;

pub use pipeline::{EngineError, SourceText, ValidationEngine};
