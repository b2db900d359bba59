use crate::types::{RuleKind, RuleTemplate};
use regex::RegexBuilder;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Default bound on wildcard expansion (rows per repeating group).
pub const DEFAULT_MAX_REPEAT: usize = 30;

/// A rule-authoring defect. These are rejected at load time with a
/// descriptive error rather than surfacing later as misleading empty rows.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read rule file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rule file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("rule file {path}: top level must be a mapping of label pattern to rule")]
    NotAMapping { path: String },
    #[error("rule file {path}: label keys must be strings")]
    NonStringLabel { path: String },
    #[error("rule '{label}': invalid rule definition")]
    InvalidRule {
        label: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("rule '{label}': search variants must not be empty")]
    EmptySearch { label: String },
    #[error("rule '{label}': search variant '{variant}' does not compile as a regex")]
    InvalidVariant {
        label: String,
        variant: String,
        #[source]
        source: regex::Error,
    },
    #[error("rule '{label}': regex rules require a pattern")]
    MissingPattern { label: String },
    #[error("rule '{label}': pattern does not compile")]
    InvalidPattern {
        label: String,
        #[source]
        source: regex::Error,
    },
    #[error("rule '{label}': pattern has no capture group")]
    NoCaptureGroup { label: String },
}

/// The loaded extraction configuration: rule templates in declaration order
/// plus the wildcard expansion bound.
///
/// A missing rule file is not an error; the engine degrades to synthesized
/// default rules for every schema label (see `rules::resolver`).
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionConfig {
    pub max_repeat: usize,
    /// Label pattern → template, in declaration order. Order matters:
    /// later-loaded rules replace earlier ones on concrete-label collisions.
    pub templates: Vec<(String, RuleTemplate)>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_repeat: DEFAULT_MAX_REPEAT,
            templates: Vec::new(),
        }
    }
}

impl ExtractionConfig {
    /// Load and validate a YAML rule file. Declaration order is preserved.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content, &path.display().to_string())
    }

    /// Load a rule file if it exists; fall back to an empty rule set when it
    /// doesn't. Authoring defects in an existing file still fail hard.
    pub fn load_with_fallback(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if p.exists() => Self::load_from_file(p),
            Some(p) => {
                eprintln!(
                    "⚠️  Rule file {} not found, using default single-line matching for every label",
                    p.display()
                );
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        // Deserialize through serde_yaml::Mapping to keep declaration order,
        // which last-write-wins collision handling depends on.
        let mapping: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: origin.to_string(),
                source,
            })?;
        let mapping = match mapping {
            serde_yaml::Value::Mapping(m) => m,
            serde_yaml::Value::Null => return Ok(Self::default()),
            _ => {
                return Err(ConfigError::NotAMapping {
                    path: origin.to_string(),
                })
            }
        };

        let mut templates = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let label = key
                .as_str()
                .ok_or_else(|| ConfigError::NonStringLabel {
                    path: origin.to_string(),
                })?
                .to_string();
            let template: RuleTemplate =
                serde_yaml::from_value(value).map_err(|source| ConfigError::InvalidRule {
                    label: label.clone(),
                    source,
                })?;
            validate_template(&label, &template)?;
            templates.push((label, template));
        }

        Ok(Self {
            max_repeat: DEFAULT_MAX_REPEAT,
            templates,
        })
    }

    pub fn with_max_repeat(mut self, max_repeat: usize) -> Self {
        self.max_repeat = max_repeat;
        self
    }
}

/// Reject authoring mistakes early: every search variant must compile as a
/// regex (variants are searched against section names), and regex rules need
/// a compiling pattern with a capture group.
fn validate_template(label: &str, template: &RuleTemplate) -> Result<(), ConfigError> {
    if template.search.is_empty() {
        return Err(ConfigError::EmptySearch {
            label: label.to_string(),
        });
    }
    for variant in &template.search {
        RegexBuilder::new(variant)
            .case_insensitive(true)
            .build()
            .map_err(|source| ConfigError::InvalidVariant {
                label: label.to_string(),
                variant: variant.clone(),
                source,
            })?;
    }
    if template.kind == RuleKind::Regex {
        let pattern = template
            .pattern
            .as_deref()
            .ok_or_else(|| ConfigError::MissingPattern {
                label: label.to_string(),
            })?;
        let compiled = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .multi_line(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                label: label.to_string(),
                source,
            })?;
        // captures_len counts the implicit whole-match group
        if compiled.captures_len() < 2 {
            return Err(ConfigError::NoCaptureGroup {
                label: label.to_string(),
            });
        }
    }
    Ok(())
}
