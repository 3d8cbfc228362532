//! Change detection against the previously persisted report.
//!
//! The default comparison is byte-exact. Reports embed a generation timestamp
//! and duration, so an exact check registers "changed" on practically every
//! rerun even when no command output moved. [`ChangeMode::Semantic`] drops
//! those volatile fields before comparing.

use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::config::OutputFormat;
use crate::error::{Result, TruthError};
use crate::pipeline::{GenerationSummary, TruthPipeline};
use crate::render::GENERATED_MARKER;

/// How old and new reports are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChangeMode {
    #[default]
    Exact,
    Semantic,
}

/// One line of a positional diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Removed { line: usize, text: String },
    Added { line: usize, text: String },
}

/// Result of a change check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeOutcome {
    pub changed: bool,
    /// No report existed; nothing was regenerated.
    pub first_run: bool,
    pub previous: Option<String>,
    pub current: Option<String>,
    pub summary: Option<GenerationSummary>,
}

impl ChangeOutcome {
    /// Positional diff of previous vs. current, empty on a first run.
    pub fn diff(&self) -> Vec<DiffLine> {
        match (self.previous.as_deref(), self.current.as_deref()) {
            (Some(old), Some(new)) => positional_diff(old, new),
            _ => Vec::new(),
        }
    }
}

/// Compares a fresh generation with the report on disk.
pub struct ChangeDetector<'a> {
    pipeline: &'a TruthPipeline,
    mode: ChangeMode,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(pipeline: &'a TruthPipeline) -> Self {
        Self {
            pipeline,
            mode: ChangeMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ChangeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Regenerate and report whether the persisted artifact changed.
    ///
    /// With no prior report this returns `changed` immediately without running
    /// any command.
    pub async fn check(&self) -> Result<ChangeOutcome> {
        let path = self.pipeline.output_path();
        if !path.exists() {
            info!(output = %path.display(), "No previous report; treating as changed");
            return Ok(ChangeOutcome {
                changed: true,
                first_run: true,
                previous: None,
                current: None,
                summary: None,
            });
        }

        let before = read_bytes(&path)?;
        let summary = self.pipeline.generate().await?;
        let after = read_bytes(&path)?;

        let changed = match self.mode {
            ChangeMode::Exact => before != after,
            ChangeMode::Semantic => {
                let format = self.pipeline.format();
                normalize(&String::from_utf8_lossy(&before), format)
                    != normalize(&String::from_utf8_lossy(&after), format)
            }
        };
        info!(output = %path.display(), changed, mode = ?self.mode, "Change check complete");

        Ok(ChangeOutcome {
            changed,
            first_run: false,
            previous: Some(String::from_utf8_lossy(&before).into_owned()),
            current: Some(String::from_utf8_lossy(&after).into_owned()),
            summary: Some(summary),
        })
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| TruthError::ReportRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Naive line-index comparison; no alignment.
pub fn positional_diff(old: &str, new: &str) -> Vec<DiffLine> {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();
    let mut diff = Vec::new();

    for i in 0..old_lines.len().max(new_lines.len()) {
        let before = old_lines.get(i);
        let after = new_lines.get(i);
        if before == after {
            continue;
        }
        if let Some(text) = before {
            diff.push(DiffLine::Removed {
                line: i + 1,
                text: text.to_string(),
            });
        }
        if let Some(text) = after {
            diff.push(DiffLine::Added {
                line: i + 1,
                text: text.to_string(),
            });
        }
    }
    diff
}

/// Strip the generation timestamp and duration.
fn normalize(report: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => match serde_json::from_str::<Value>(report) {
            Ok(mut value) => {
                if let Some(meta) = value.get_mut("meta").and_then(Value::as_object_mut) {
                    meta.remove("generated");
                    meta.remove("duration_ms");
                }
                value.to_string()
            }
            Err(_) => report.to_string(),
        },
        OutputFormat::Markdown | OutputFormat::Html => {
            let quoted = format!("> {GENERATED_MARKER}");
            let tagged = format!("<blockquote>{GENERATED_MARKER}");
            report
                .lines()
                .filter(|l| !l.starts_with(&quoted) && !l.starts_with(&tagged))
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}
