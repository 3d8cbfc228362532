//! Report rendering.
//!
//! Rendering is a pure function of the result tree, the error list, the
//! format and an explicit [`RenderOptions`] value. JSON is the lossless
//! superset; markdown is the human-facing projection; HTML is derived from the
//! markdown text.

pub mod html;
pub mod markdown;

use serde::Serialize;

use crate::config::{OutputFormat, DEFAULT_CONFIG_FILE};
use crate::error::Result;
use crate::model::{ErrorRecord, ResultTree};

pub use html::markdown_to_html;
pub use markdown::render_markdown;

/// Maximum output lines shown per truth-source.
pub const MAX_OUTPUT_LINES: usize = 100;

/// Maximum characters of validation output shown in the results table.
pub const EXCERPT_WIDTH: usize = 50;

/// Marker that starts the metadata line in text formats.
pub const GENERATED_MARKER: &str = "Generated: ";

/// Rendering configuration, passed explicitly to every render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Configuration path shown in the footer.
    pub config_label: String,
    pub max_output_lines: usize,
    pub excerpt_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            config_label: DEFAULT_CONFIG_FILE.to_string(),
            max_output_lines: MAX_OUTPUT_LINES,
            excerpt_width: EXCERPT_WIDTH,
        }
    }
}

impl RenderOptions {
    pub fn new(config_label: impl Into<String>) -> Self {
        Self {
            config_label: config_label.into(),
            ..Self::default()
        }
    }
}

/// Structured report document: the result tree with the error list attached.
#[derive(Serialize)]
struct ReportDocument<'a> {
    #[serde(flatten)]
    tree: &'a ResultTree,
    errors: &'a [ErrorRecord],
}

/// Render the report in `format`.
pub fn render(
    tree: &ResultTree,
    errors: &[ErrorRecord],
    format: OutputFormat,
    options: &RenderOptions,
) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(tree, errors),
        OutputFormat::Markdown => Ok(render_markdown(tree, errors, options)),
        OutputFormat::Html => {
            let markdown = render_markdown(tree, errors, options);
            Ok(markdown_to_html(&markdown, &tree.meta.project))
        }
    }
}

/// Pretty JSON of the tree plus errors, newline-terminated.
pub fn render_json(tree: &ResultTree, errors: &[ErrorRecord]) -> Result<String> {
    let mut out = serde_json::to_string_pretty(&ReportDocument { tree, errors })?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Utc};

    use crate::config::Directive;
    use crate::model::{
        ErrorKind, ErrorRecord, ExecutionResult, ReportMeta, ResultTree, ValidationResult,
    };

    pub fn tree() -> ResultTree {
        let mut tree = ResultTree::new(ReportMeta {
            project: "demo".to_string(),
            generated: DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .expect("parse RFC3339")
                .with_timezone(&Utc),
            version: "0.3.1".to_string(),
            duration_ms: 42,
        });
        tree.sources = Some(vec![ExecutionResult::from_directive(
            &Directive::new("Echo", "echo hi").essential(),
            "hi".to_string(),
        )]);
        tree.validations = Some(vec![
            ValidationResult {
                result: ExecutionResult::from_directive(
                    &Directive::new("Build", "cargo check").required(),
                    "✓ builds".to_string(),
                ),
                passed: true,
            },
            ValidationResult {
                result: ExecutionResult::from_directive(
                    &Directive::new("Lint", "cargo clippy"),
                    "FAIL | 3 warnings".to_string(),
                ),
                passed: false,
            },
        ]);
        tree
    }

    pub fn errors() -> Vec<ErrorRecord> {
        vec![ErrorRecord {
            kind: ErrorKind::Validation,
            source: "Lint".to_string(),
            message: "FAIL | 3 warnings".to_string(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_is_lossless() {
        let tree = fixtures::tree();
        let errors = fixtures::errors();
        let json = render(&tree, &errors, OutputFormat::Json, &RenderOptions::default()).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(raw["errors"][0]["type"], "validation");
        assert!(raw.get("examples").is_none());

        let back: ResultTree = serde_json::from_value(raw).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_render_idempotent_all_formats() {
        let tree = fixtures::tree();
        let errors = fixtures::errors();
        let options = RenderOptions::new("custom.yml");
        for format in [OutputFormat::Markdown, OutputFormat::Json, OutputFormat::Html] {
            let first = render(&tree, &errors, format, &options).unwrap();
            let second = render(&tree, &errors, format, &options).unwrap();
            assert_eq!(first, second, "{format} output not stable");
        }
    }
}
