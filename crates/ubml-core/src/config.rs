//! Configuration schema (ubml.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use glob::{MatchOptions, Pattern};
use std::path::{Component, Path, PathBuf};
use crate::diagnostic::{DiagnosticCode, Severity};
use crate::ids::{IdFormat, DEFAULT_ID_DIGITS};

/// Validation behaviour switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Promote every warning to an error
    #[serde(default)]
    pub strict: bool,

    /// Do not report identifiers nobody references
    #[serde(default)]
    pub suppress_unused_warnings: bool,

    /// Minimum digits in an identifier
    #[serde(default = "default_id_digits")]
    pub id_digits: usize,
}

fn default_id_digits() -> usize {
    DEFAULT_ID_DIGITS
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            strict: false,
            suppress_unused_warnings: false,
            id_digits: DEFAULT_ID_DIGITS,
        }
    }
}

impl ValidationOptions {
    pub fn id_format(&self) -> IdFormat {
        IdFormat::new(self.id_digits)
    }
}

/// Severity threshold overrides for specific diagnostic codes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityThreshold {
    /// Map of diagnostic code to severity override
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for a diagnostic code, or default
    pub fn get_severity(&self, code: DiagnosticCode, default: Severity) -> Severity {
        self.overrides
            .get(code.as_str())
            .copied()
            .unwrap_or(default)
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: DiagnosticCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }
}

/// Files excluded from validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IgnoreRules {
    /// Glob patterns matched against file paths
    #[serde(default)]
    pub files: Vec<String>,
}

impl IgnoreRules {
    /// Check if a file under `root` should be skipped
    ///
    /// Patterns are matched against the path relative to `root`, with any
    /// `./` segments dropped. `*` stays inside one directory and `**`
    /// spans any number of them.
    pub fn is_ignored(&self, file: &str, root: &Path) -> bool {
        let relative = relative_path(Path::new(file), root);
        self.files.iter().any(|pattern| {
            let trimmed = without_current_dir(Path::new(pattern));
            match Pattern::new(&trimmed.to_string_lossy()) {
                Ok(glob) => glob.matches_path_with(&relative, MATCH_OPTIONS),
                Err(_) => trimmed == relative,
            }
        })
    }
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn relative_path(path: &Path, root: &Path) -> PathBuf {
    let path = without_current_dir(path);
    match path.strip_prefix(without_current_dir(root)) {
        Ok(inside) => inside.to_path_buf(),
        Err(_) => path,
    }
}

fn without_current_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub validation: ValidationOptions,

    /// Severity overrides
    #[serde(default)]
    pub severity: SeverityThreshold,

    #[serde(default)]
    pub ignore: IgnoreRules,

    /// Directory holding `<type>.schema.json|yaml` files, relative to the project root
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            validation: ValidationOptions::default(),
            severity: SeverityThreshold::default(),
            ignore: IgnoreRules::default(),
            schema_dir: None,
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if config.validation.id_digits == 0 {
            return Err(ConfigError::Invalid(
                "validation.id_digits must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }

    /// Check if a file is excluded by `[ignore]`, relative to the project root
    pub fn is_ignored(&self, file: &str) -> bool {
        self.ignore.is_ignored(file, &self.project_root)
    }

    /// Schema directory resolved against the project root
    pub fn resolved_schema_dir(&self) -> Option<PathBuf> {
        self.schema_dir.as_ref().map(|dir| {
            if dir.is_relative() {
                self.project_root.join(dir)
            } else {
                dir.clone()
            }
        })
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
