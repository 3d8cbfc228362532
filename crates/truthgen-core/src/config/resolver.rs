//! Configuration loading and preset resolution.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use super::merge::deep_merge;
use super::presets::bundled_preset;
use super::{OutputFormat, TruthConfig};
use crate::error::{Result, TruthError};

/// Project-local preset directory, relative to the config file.
pub const PROJECT_PRESET_DIR: &str = ".truth/presets";

/// Caller-supplied settings applied after preset merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub output: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub timeout_secs: Option<u64>,
    pub fail_on_error: Option<bool>,
}

/// Where a preset was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetOrigin {
    Bundled,
    Directory(PathBuf),
}

/// Resolves a configuration document into a [`TruthConfig`].
///
/// Preset lookup order is fixed: bundled presets first, then the
/// project-local directory. The first hit wins.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    preset_dir: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `dir` instead of `<config dir>/.truth/presets` for project presets.
    pub fn with_preset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.preset_dir = Some(dir.into());
        self
    }

    /// Load `path`, merge its preset (if any), then apply `overrides`.
    pub fn resolve(&self, path: &Path, overrides: &ConfigOverrides) -> Result<TruthConfig> {
        let document = load_document(path)?;

        let merged = match document.get("extends").and_then(Value::as_str) {
            Some(name) => match self.locate_preset(name, path)? {
                Some((preset, origin)) => {
                    debug!(preset = %name, origin = ?origin, "Merging preset");
                    deep_merge(preset, document)
                }
                None => {
                    warn!(preset = %name, "Preset not found; continuing without it");
                    document
                }
            },
            None => document,
        };

        let mut config: TruthConfig =
            serde_json::from_value(merged).map_err(|e| TruthError::ConfigParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.source_path = Some(path.to_path_buf());

        apply_overrides(&mut config, overrides);
        Ok(config)
    }

    /// Search bundled presets, then the project preset directory.
    pub fn locate_preset(
        &self,
        name: &str,
        config_path: &Path,
    ) -> Result<Option<(Value, PresetOrigin)>> {
        if let Some(body) = bundled_preset(name) {
            let value = parse_yaml(body, Path::new(name))?;
            return Ok(Some((value, PresetOrigin::Bundled)));
        }

        let dir = self.preset_dir.clone().unwrap_or_else(|| {
            config_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(PROJECT_PRESET_DIR)
        });

        for ext in ["yml", "yaml"] {
            let candidate = dir.join(format!("{name}.{ext}"));
            if candidate.is_file() {
                let value = load_document(&candidate)?;
                return Ok(Some((value, PresetOrigin::Directory(candidate))));
            }
        }

        Ok(None)
    }
}

fn apply_overrides(config: &mut TruthConfig, overrides: &ConfigOverrides) {
    if let Some(output) = &overrides.output {
        config.output = Some(output.clone());
    }
    if let Some(format) = overrides.format {
        config.format = Some(format);
    }
    if let Some(timeout) = overrides.timeout_secs {
        config.meta.timeout_seconds = Some(timeout);
    }
    if let Some(fail_on_error) = overrides.fail_on_error {
        config.meta.fail_on_error = fail_on_error;
    }
}

/// Read a YAML (or JSON) document as a mapping.
fn load_document(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TruthError::ConfigNotFound {
            path: path.to_path_buf(),
        },
        _ => TruthError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
    })?;
    parse_yaml(&raw, path)
}

fn parse_yaml(raw: &str, path: &Path) -> Result<Value> {
    let value: Value = serde_yaml::from_str(raw).map_err(|e| TruthError::ConfigParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    match value {
        Value::Null => Ok(Value::Object(Default::default())),
        Value::Object(_) => Ok(value),
        _ => Err(TruthError::ConfigParse {
            path: path.to_path_buf(),
            message: "expected a mapping at the top level".to_string(),
        }),
    }
}
