//! Structural heuristics for `pattern` failures
//!
//! Each rule looks at the offending value and the schema pattern and either
//! explains the likely mistake or passes. Rules run in table order and the
//! first one that fires wins.

use regex::Regex;
use std::sync::LazyLock;

/// Identifier-shaped value
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]{2,3})(\d+)$").unwrap());

/// Minimum digit count written as `\d{N}` or `\d{N,}` in a schema pattern
static DIGIT_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\d\{(\d+)(?:,\d*)?\}").unwrap());

/// Units tried on a bare number
const DURATION_UNITS: [&str; 7] = ["min", "h", "d", "wk", "mo", "s", "ms"];

/// A named heuristic
#[derive(Clone, Copy)]
pub struct PatternRule {
    pub name: &'static str,
    check: fn(&str, &Regex, &str) -> Option<String>,
}

impl std::fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternRule").field("name", &self.name).finish()
    }
}

impl PatternRule {
    /// Hint for `value` failing `pattern`, if this rule recognises the mistake
    pub fn apply(&self, value: &str, compiled: &Regex, pattern: &str) -> Option<String> {
        (self.check)(value, compiled, pattern)
    }
}

/// All heuristics in priority order
pub const PATTERN_RULES: &[PatternRule] = &[
    PatternRule {
        name: "surrounding-whitespace",
        check: surrounding_whitespace,
    },
    PatternRule {
        name: "missing-unit",
        check: missing_unit,
    },
    PatternRule {
        name: "identifier-digits",
        check: identifier_digits,
    },
    PatternRule {
        name: "lowercase-prefix",
        check: lowercase_prefix,
    },
];

/// First heuristic hint for `value` failing `pattern`
///
/// Patterns the regex engine cannot compile get no heuristic hint.
pub fn pattern_heuristic(value: &str, pattern: &str) -> Option<String> {
    let compiled = match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::debug!(pattern, error = %e, "schema pattern not usable for heuristics");
            return None;
        }
    };

    PATTERN_RULES.iter().find_map(|rule| {
        let hint = rule.apply(value, &compiled, pattern)?;
        tracing::trace!(rule = rule.name, "pattern heuristic matched");
        Some(hint)
    })
}

fn surrounding_whitespace(value: &str, compiled: &Regex, _pattern: &str) -> Option<String> {
    let trimmed = value.trim();
    (trimmed != value && compiled.is_match(trimmed))
        .then(|| format!("Remove the surrounding whitespace: '{}'", trimmed))
}

fn missing_unit(value: &str, compiled: &Regex, _pattern: &str) -> Option<String> {
    let number = value.trim();
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let accepted: Vec<String> = DURATION_UNITS
        .iter()
        .map(|unit| format!("{}{}", number, unit))
        .filter(|candidate| compiled.is_match(candidate))
        .collect();

    if accepted.is_empty() {
        return None;
    }
    Some(format!(
        "Missing unit: '{}' needs a unit suffix, e.g. {}",
        number,
        accepted.join(", ")
    ))
}

fn identifier_digits(value: &str, compiled: &Regex, pattern: &str) -> Option<String> {
    let captures = IDENTIFIER_RE.captures(value.trim())?;
    let prefix = captures.get(1)?.as_str();
    let digits = captures.get(2)?.as_str();

    let required: usize = DIGIT_COUNT_RE
        .captures_iter(pattern)
        .filter_map(|c| c.get(1)?.as_str().parse().ok())
        .max()?;
    if digits.len() >= required {
        return None;
    }

    let padded = format!("{}{:0>width$}", prefix, digits, width = required);
    let fixed = if compiled.is_match(&padded) {
        padded
    } else {
        format!("{}{:0>width$}", prefix.to_uppercase(), digits, width = required)
    };
    Some(format!(
        "Identifier needs at least {} digits: '{}'",
        required, fixed
    ))
}

fn lowercase_prefix(value: &str, compiled: &Regex, _pattern: &str) -> Option<String> {
    let trimmed = value.trim();
    let captures = IDENTIFIER_RE.captures(trimmed)?;
    let prefix = captures.get(1)?.as_str();
    if prefix.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }

    let upper = trimmed.to_uppercase();
    compiled
        .is_match(&upper)
        .then(|| format!("Identifier prefixes are uppercase: '{}'", upper))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DURATION: &str = r"^\d+(\.\d+)?(min|h|d|wk|mo)$";
    const ACTOR_ID: &str = r"^AC\d{5,}$";

    #[test]
    fn bare_number_is_missing_unit() {
        let hint = pattern_heuristic("90", DURATION).unwrap();
        assert!(hint.starts_with("Missing unit"), "{hint}");
        assert!(hint.contains("90min"));
        assert!(hint.contains("90h"));
        assert!(!hint.contains("90s"));
    }

    #[test]
    fn short_identifier() {
        assert_eq!(
            pattern_heuristic("AC1", ACTOR_ID).as_deref(),
            Some("Identifier needs at least 5 digits: 'AC00001'")
        );
    }

    #[test]
    fn lowercase_identifier() {
        assert_eq!(
            pattern_heuristic("ac00001", ACTOR_ID).as_deref(),
            Some("Identifier prefixes are uppercase: 'AC00001'")
        );
    }

    #[test]
    fn whitespace_rule_runs_first() {
        let hint = pattern_heuristic(" AC00001 ", ACTOR_ID).unwrap();
        assert!(hint.starts_with("Remove the surrounding whitespace"));
    }

    #[test]
    fn unrecognised_mistake_has_no_hint() {
        assert_eq!(pattern_heuristic("soon", DURATION), None);
        assert_eq!(pattern_heuristic("AC00001", "(unclosed"), None);
    }

    #[test]
    fn rule_names_are_unique() {
        let mut names: Vec<_> = PATTERN_RULES.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), PATTERN_RULES.len());
    }
}
