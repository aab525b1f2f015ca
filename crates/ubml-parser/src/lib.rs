//! Source-mapped parsing of UBML documents
//!
//! This crate handles:
//! - Parsing YAML text into a typed [`ubml_core::Document`]
//! - Recording the line/column of every value from the same event stream
//! - Detecting the document type from filename or content
//! - Serializing content back to YAML

pub mod parser;
pub mod loader;
pub mod detect;
pub mod serialize;

pub use parser::{parse, ParseOutcome};
pub use loader::{load, LoadError, Loaded};
pub use detect::{detect_document_type, detect_from_content, detect_from_filename};
pub use serialize::to_yaml;
