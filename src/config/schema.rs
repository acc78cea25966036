use crate::ts::Language;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Contents of a `pathexpr.toml` file.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub microgrammars: Vec<MicrogrammarDef>,
    #[serde(default)]
    pub patterns: Vec<PatternDef>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        let names = self
            .microgrammars
            .iter()
            .map(|m| m.name.as_str())
            .chain(self.patterns.iter().map(|p| p.name.as_str()));
        for name in names {
            if name.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    type_name: None,
                    field: "name",
                });
            } else if !seen.insert(name) {
                issues.push(ValidationIssue::DuplicateName {
                    name: name.to_string(),
                });
            }
        }

        for def in &self.microgrammars {
            if def.grammar.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    type_name: Some(def.name.clone()),
                    field: "grammar",
                });
            }
        }

        for def in &self.patterns {
            if def.pattern.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    type_name: Some(def.name.clone()),
                    field: "pattern",
                });
            }
            if def.language.parse::<Language>().is_err() {
                issues.push(ValidationIssue::UnknownLanguage {
                    type_name: def.name.clone(),
                    language: def.language.clone(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineSection {
    #[serde(default)]
    pub dedupe_by_address: bool,
    /// Register the built-in language views.
    #[serde(default = "default_true")]
    pub default_types: bool,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            dedupe_by_address: false,
            default_types: true,
        }
    }
}

/// How a directory on disk becomes a [`Project`](crate::project::Project).
#[derive(Debug, Deserialize, Clone)]
pub struct ProjectConfig {
    /// File or directory names skipped while walking.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MicrogrammarDef {
    pub name: String,
    pub grammar: String,
    /// Regex text per `$binding`; unlisted bindings use the word matcher.
    #[serde(default)]
    pub submatchers: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PatternDef {
    pub name: String,
    pub language: String,
    pub pattern: String,
}

fn default_true() -> bool {
    true
}

fn default_ignore() -> Vec<String> {
    vec![".git".to_string(), "target".to_string()]
}

fn default_max_file_bytes() -> u64 {
    1024 * 1024
}

#[derive(Debug, Clone, Error)]
#[error("{}", render_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("type {}missing required field '{field}'", quoted(.type_name))]
    MissingField {
        type_name: Option<String>,
        field: &'static str,
    },

    #[error("type '{name}' is defined more than once")]
    DuplicateName { name: String },

    #[error("pattern '{type_name}' uses unknown language '{language}'")]
    UnknownLanguage { type_name: String, language: String },
}

fn quoted(name: &Option<String>) -> String {
    name.as_ref()
        .map(|n| format!("'{n}' "))
        .unwrap_or_default()
}
