//! End-to-end pipeline: resolve → assemble → render → persist.
//!
//! [`TruthPipeline::generate`] is the single entry point used by the CLI and
//! by any watcher; it may be called repeatedly and builds a fresh result tree
//! every time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::assembler::{Assembly, TruthAssembler};
use crate::config::{ConfigOverrides, ConfigResolver, OutputFormat, TruthConfig, DEFAULT_CONFIG_FILE};
use crate::error::{Result, TruthError};
use crate::executor::{CommandRunner, ShellExecutor};
use crate::model::ErrorRecord;
use crate::render::{render, RenderOptions};

/// Resolved options handed over by the command-line layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub config_path: PathBuf,
    pub output: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub timeout_secs: Option<u64>,
    /// Console and log verbosity; read by the front end, not the pipeline.
    pub silent: bool,
    pub verbose: bool,
    pub fail_on_error: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            output: None,
            format: None,
            timeout_secs: None,
            silent: false,
            verbose: false,
            fail_on_error: false,
        }
    }
}

impl RunOptions {
    /// Caller intent as config overrides; `fail_on_error` only ever turns it on.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            output: self.output.clone(),
            format: self.format,
            timeout_secs: self.timeout_secs,
            fail_on_error: self.fail_on_error.then_some(true),
        }
    }
}

/// Outcome of one generate + persist cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub output_path: PathBuf,
    pub format: OutputFormat,
    pub commands: usize,
    pub validations_passed: usize,
    pub validations_total: usize,
    pub errors: Vec<ErrorRecord>,
    pub duration_ms: u64,
}

impl GenerationSummary {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A resolved configuration bound to a command runner.
#[derive(Clone)]
pub struct TruthPipeline {
    config: TruthConfig,
    runner: Arc<dyn CommandRunner>,
}

impl TruthPipeline {
    pub fn new(config: TruthConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    /// Pipeline backed by the host shell, fail-fast when the config asks for it.
    pub fn with_shell(config: TruthConfig) -> Self {
        let runner = ShellExecutor::new().fail_fast(config.fail_on_error());
        Self::new(config, Arc::new(runner))
    }

    /// Resolve the configuration named by `options` and bind the shell runner.
    pub fn load(options: &RunOptions) -> Result<Self> {
        let config = ConfigResolver::new().resolve(&options.config_path, &options.overrides())?;
        Ok(Self::with_shell(config))
    }

    pub fn config(&self) -> &TruthConfig {
        &self.config
    }

    pub fn output_path(&self) -> PathBuf {
        self.config.output_path()
    }

    pub fn format(&self) -> OutputFormat {
        self.config.output_format()
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::new(self.config.config_label())
    }

    /// Run every directive and return the result tree and error list.
    pub async fn assemble(&self) -> Result<Assembly> {
        TruthAssembler::new(self.runner.clone())
            .generate(&self.config)
            .await
    }

    /// Render an assembly in the configured format.
    pub fn render(&self, assembly: &Assembly) -> Result<String> {
        render(
            &assembly.tree,
            &assembly.errors,
            self.format(),
            &self.render_options(),
        )
    }

    /// Assemble, render and write the report.
    pub async fn generate(&self) -> Result<GenerationSummary> {
        let assembly = self.assemble().await?;
        let report = self.render(&assembly)?;
        let output_path = self.output_path();
        write_report(&output_path, &report)?;
        info!(output = %output_path.display(), format = %self.format(), "Report written");

        Ok(GenerationSummary {
            output_path,
            format: self.format(),
            commands: assembly.tree.command_count(),
            validations_passed: assembly.tree.passed_count(),
            validations_total: assembly.tree.validation_count(),
            errors: assembly.errors,
            duration_ms: assembly.tree.meta.duration_ms,
        })
    }
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_report(path: &Path, contents: &str) -> Result<()> {
    let to_err = |source| TruthError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(to_err)?;
    }
    std::fs::write(path, contents).map_err(to_err)
}
