//! Serialization back to YAML

use ubml_core::Value;

/// Render content as YAML text that [`crate::parse`] accepts
pub fn to_yaml(value: &Value) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(value)
}
