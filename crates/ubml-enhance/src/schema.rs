//! Enhancement of structural (schema) findings

use serde::Serialize;
use serde_json::Value as JsonValue;
use ubml_core::{FindingParams, HintCatalog, Keyword, RawValidationFinding, SchemaContext};

use crate::distance::closest_match;
use crate::rules::pattern_heuristic;

/// A finding rewritten for people
///
/// `message` stands on its own; everything else is extra context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnhancedDiagnostic {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub valid_options: Vec<String>,
}

impl EnhancedDiagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

/// Enhances schema findings using the schema-declared hint catalog
///
/// Scoped hints are found through [`SchemaContext::schema_location`]; without
/// a context only pattern explanations and heuristics apply.
#[derive(Debug, Clone, Copy)]
pub struct Enhancer<'a> {
    hints: &'a HintCatalog,
}

impl<'a> Enhancer<'a> {
    pub fn new(hints: &'a HintCatalog) -> Self {
        Self { hints }
    }

    /// Enhance one finding
    ///
    /// Never fails. A finding the enhancer knows nothing about still gets a
    /// message.
    pub fn enhance(
        &self,
        finding: &RawValidationFinding,
        context: Option<&SchemaContext>,
    ) -> EnhancedDiagnostic {
        let at = describe_path(parent_path(&finding.instance_path));
        let here = describe_path(&finding.instance_path);
        let location = context.and_then(|c| c.schema_location.as_deref());

        match (&finding.keyword, &finding.params) {
            (Keyword::AdditionalProperties, FindingParams::AdditionalProperties { property }) => {
                self.unknown_property(property, &at, context)
            }
            (_, FindingParams::Enum { allowed }) => {
                self.invalid_option(&finding.keyword, finding.data.as_ref(), allowed, &here, location)
            }
            (Keyword::Pattern, FindingParams::Pattern { pattern }) => {
                self.pattern_mismatch(pattern, finding.data.as_ref(), &here)
            }
            (Keyword::Required, FindingParams::Required { property }) => {
                let mut diag =
                    EnhancedDiagnostic::new(format!("Missing required property '{}' {}", property, here));
                diag.example = location
                    .and_then(|l| self.hints.property_example(l, property))
                    .map(str::to_string);
                diag
            }
            (Keyword::Type, FindingParams::Type { expected }) => {
                wrong_type(expected, finding.data.as_ref(), &finding.instance_path, &here)
            }
            (keyword, FindingParams::Other { message }) => {
                EnhancedDiagnostic::new(format!("{} {} ({})", capitalize(message), here, keyword.as_str()))
            }
            (keyword, _) => {
                EnhancedDiagnostic::new(format!("Value {} violates '{}'", here, keyword.as_str()))
            }
        }
    }

    fn unknown_property(
        &self,
        property: &str,
        at: &str,
        context: Option<&SchemaContext>,
    ) -> EnhancedDiagnostic {
        let mut diag = EnhancedDiagnostic::new(format!("Unknown property '{}' {}", property, at));
        let location = context.and_then(|c| c.schema_location.as_deref());

        if let Some(nesting) = location.and_then(|l| self.hints.nesting(l, property)) {
            diag.suggestion = Some(format!("Move '{}' under '{}'", property, nesting.parent));
            diag.example = Some(nesting.example.clone());
            return diag;
        }

        if let Some(context) = context {
            if let Some(best) = closest_match(property, &context.valid_properties) {
                diag.suggestion = Some(format!("Did you mean '{}'?", best));
                diag.example = location
                    .and_then(|l| self.hints.property_example(l, &best))
                    .map(str::to_string);
            }
            let mut options = context.valid_properties.clone();
            options.sort();
            diag.valid_options = options;
        }
        diag
    }

    fn invalid_option(
        &self,
        keyword: &Keyword,
        data: Option<&JsonValue>,
        allowed: &[JsonValue],
        here: &str,
        location: Option<&str>,
    ) -> EnhancedDiagnostic {
        let value = data.map(render).unwrap_or_default();
        let options: Vec<String> = allowed.iter().map(render).collect();

        let message = if *keyword == Keyword::Const && options.len() == 1 {
            format!("Value '{}' {} must be '{}'", value, here, options[0])
        } else {
            format!("Invalid value '{}' {}", value, here)
        };
        let mut diag = EnhancedDiagnostic::new(message);

        if let Some(literal) = location.and_then(|l| self.hints.enum_mistake(l, &value)) {
            diag.hint = Some(literal.to_string());
        } else if let Some(best) = closest_match(&value, &options) {
            diag.suggestion = Some(format!("Did you mean '{}'?", best));
        }
        diag.valid_options = options;
        diag
    }

    fn pattern_mismatch(
        &self,
        pattern: &str,
        data: Option<&JsonValue>,
        here: &str,
    ) -> EnhancedDiagnostic {
        let value = data.map(render).unwrap_or_default();
        let mut diag = match self.hints.pattern(pattern) {
            Some(declared) => {
                let mut diag = EnhancedDiagnostic::new(format!(
                    "Value '{}' {} is not {}",
                    value, here, declared.description
                ));
                diag.hint = Some(format!("Expected {}", declared.description));
                diag.example = declared.example.clone();
                diag
            }
            None => EnhancedDiagnostic::new(format!(
                "Value '{}' {} does not match pattern {}",
                value, here, pattern
            )),
        };
        diag.suggestion = pattern_heuristic(&value, pattern);
        diag
    }
}

fn wrong_type(
    expected: &[String],
    data: Option<&JsonValue>,
    path: &str,
    here: &str,
) -> EnhancedDiagnostic {
    let actual = data.map(json_type).unwrap_or("nothing");
    let wanted = if expected.is_empty() {
        "a different type".to_string()
    } else {
        expected.join(" or ")
    };
    let mut diag = EnhancedDiagnostic::new(format!("Expected {} {}, got {}", wanted, here, actual));

    let scalar = matches!(actual, "string" | "integer" | "number" | "boolean");
    if scalar && expected.iter().any(|t| t == "array") {
        let value = data.map(render).unwrap_or_default();
        let key = last_segment(path);
        diag.suggestion = Some(format!("Wrap the value in a list: [{}]", value));
        diag.example = Some(format!("{}:\n  - {}", key, value));
    } else if scalar && expected.iter().any(|t| t == "object") {
        diag.hint = Some("This property takes nested properties, not a single value".to_string());
    }
    diag
}

/// Value as a user would write it
fn render(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => "integer",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn describe_path(path: &str) -> String {
    if path.is_empty() {
        "at document root".to_string()
    } else {
        format!("at {}", path)
    }
}

fn parent_path(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

fn last_segment(path: &str) -> String {
    path.rsplit('/')
        .next()
        .unwrap_or(path)
        .replace("~1", "/")
        .replace("~0", "~")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
