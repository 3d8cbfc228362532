//! Configuration model, preset inheritance and resolution.
//!
//! A configuration document declares scalar settings plus five ordered
//! directive lists. Documents are YAML (JSON is accepted as a subset) and may
//! inherit from a named preset via `extends`; see [`merge`] for the
//! deep-merge rules and [`resolver`] for the lookup order.

pub mod merge;
pub mod presets;
pub mod resolver;

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use merge::{deep_merge, REPLACE_SENTINEL};
pub use presets::{bundled_preset, bundled_preset_names};
pub use resolver::{ConfigOverrides, ConfigResolver, PresetOrigin};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".truth.yml";

/// Default report location when neither config nor caller names one.
pub const DEFAULT_OUTPUT: &str = "docs/TRUTH.md";

/// Default per-command timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Report serialization format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    #[serde(alias = "md")]
    Markdown,
    Json,
    #[serde(alias = "htm")]
    Html,
}

impl OutputFormat {
    /// Infer the format from a report path's extension, defaulting to markdown.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => OutputFormat::Json,
            Some("html") | Some("htm") => OutputFormat::Html,
            _ => OutputFormat::Markdown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            "html" | "htm" => Ok(OutputFormat::Html),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// One named, command-backed entry in a directive list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Directive {
    /// Display key. Not required to be unique.
    pub name: String,

    /// Shell command line, passed to the host shell verbatim.
    pub command: String,

    /// Per-directive timeout in seconds, overriding the global default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Truth-source flag: a failing essential source is recorded as an error.
    #[serde(default)]
    pub essential: bool,

    /// Validation flag: a failing required validation is recorded as an error.
    #[serde(default)]
    pub required: bool,

    /// Grouping key for truth-sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Regular expression a validation's output must match.
    #[serde(
        default,
        alias = "successPattern",
        skip_serializing_if = "Option::is_none"
    )]
    pub success_pattern: Option<String>,

    /// Free-text description shown with working examples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Unit appended to benchmark values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Directive {
    /// Minimal directive with only a name and command.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            timeout: None,
            essential: false,
            required: false,
            category: None,
            success_pattern: None,
            description: None,
            unit: None,
        }
    }

    pub fn essential(mut self) -> Self {
        self.essential = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(secs);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_success_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.success_pattern = Some(pattern.into());
        self
    }
}

/// The `meta` block of a configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    #[serde(default)]
    pub fail_on_error: bool,
}

/// A fully-resolved configuration. Read-only once resolution completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TruthConfig {
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    #[serde(default)]
    pub meta: ConfigMeta,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truth_sources: Option<Vec<Directive>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<Vec<Directive>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_examples: Option<Vec<Directive>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmarks: Option<Vec<Directive>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Vec<Directive>>,

    /// Path the configuration was loaded from; shown in the report footer.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl TruthConfig {
    /// Project name, falling back to the name of the directory holding the config.
    pub fn project_name(&self) -> String {
        if let Some(project) = self.project.as_deref().filter(|p| !p.trim().is_empty()) {
            return project.to_string();
        }
        self.source_path
            .as_deref()
            .and_then(|p| p.canonicalize().ok())
            .and_then(|p| p.parent().and_then(|d| d.file_name()).map(|n| n.to_os_string()))
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Project".to_string())
    }

    /// Report path: configured output, else [`DEFAULT_OUTPUT`].
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
    }

    /// Explicit format, else inferred from the output path.
    pub fn output_format(&self) -> OutputFormat {
        self.format
            .unwrap_or_else(|| OutputFormat::from_path(&self.output_path()))
    }

    /// Global default timeout for directives without their own.
    pub fn default_timeout(&self) -> u64 {
        self.meta.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    pub fn fail_on_error(&self) -> bool {
        self.meta.fail_on_error
    }

    /// Label used for the config in report footers.
    pub fn config_label(&self) -> String {
        self.source_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string())
    }
}

/// Accept `version: 1`, `version: 1.2` or `version: "1.2.0"` alike.
fn scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
