//! Result tree produced by a single `generate` run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Directive;

/// Captured output of one directive. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionResult {
    pub name: String,
    pub command: String,
    pub output: String,

    #[serde(default)]
    pub essential: bool,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl ExecutionResult {
    pub fn from_directive(directive: &Directive, output: String) -> Self {
        Self {
            name: directive.name.clone(),
            command: directive.command.clone(),
            output,
            essential: directive.essential,
            required: directive.required,
            category: directive.category.clone(),
            description: directive.description.clone(),
            unit: directive.unit.clone(),
        }
    }
}

/// A validation result with its pass/fail verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    #[serde(flatten)]
    pub result: ExecutionResult,
    pub passed: bool,
}

/// Which flag escalated a failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Essential,
    Validation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Essential => "essential",
            ErrorKind::Validation => "validation",
        }
    }
}

/// A failure of an essential source or required validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorRecord {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub source: String,
    pub message: String,
}

/// Generation metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportMeta {
    pub project: String,
    pub generated: DateTime<Utc>,
    pub version: String,
    pub duration_ms: u64,
}

/// Unified result tree. A section is `None` when its directive list was
/// absent from the configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultTree {
    pub meta: ReportMeta,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<ExecutionResult>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<Vec<ValidationResult>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<ExecutionResult>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmarks: Option<Vec<ExecutionResult>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Vec<ExecutionResult>>,
}

impl ResultTree {
    /// Empty tree with the given metadata.
    pub fn new(meta: ReportMeta) -> Self {
        Self {
            meta,
            sources: None,
            validations: None,
            examples: None,
            benchmarks: None,
            platform: None,
        }
    }

    /// Number of validations that passed.
    pub fn passed_count(&self) -> usize {
        self.validations
            .as_deref()
            .map(|v| v.iter().filter(|r| r.passed).count())
            .unwrap_or(0)
    }

    /// Number of validations run.
    pub fn validation_count(&self) -> usize {
        self.validations.as_deref().map(<[_]>::len).unwrap_or(0)
    }

    /// Total directives executed across all sections.
    pub fn command_count(&self) -> usize {
        [&self.sources, &self.examples, &self.benchmarks, &self.platform]
            .iter()
            .map(|s| s.as_deref().map(<[_]>::len).unwrap_or(0))
            .sum::<usize>()
            + self.validation_count()
    }
}
