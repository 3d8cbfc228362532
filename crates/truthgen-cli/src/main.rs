//! truthgen - documentation regenerated from live command output
//!
//! ## Commands
//!
//! - `generate` (default): run every directive and write the report
//! - `check`: regenerate and report whether the persisted report changed
//! - `init`: write a starter `.truth.yml`
//! - `presets`: list bundled presets

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::Level;

use truthgen_core::config::bundled_preset_names;
use truthgen_core::{
    ChangeDetector, ChangeMode, DiffLine, GenerationSummary, OutputFormat, RunOptions,
    TruthPipeline, DEFAULT_CONFIG_FILE,
};

#[derive(Parser)]
#[command(name = "truthgen")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate project documentation from live command output", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct GlobalArgs {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Report path (overrides the config)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Report format: markdown, json or html (default: from the output extension)
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Default per-command timeout in seconds
    #[arg(short, long, global = true)]
    timeout: Option<u64>,

    /// Suppress console output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    silent: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Abort on the first failing command and exit non-zero on recorded errors
    #[arg(long, global = true)]
    fail_on_error: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored console output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every directive and write the report
    Generate,

    /// Regenerate and report whether the persisted report changed (exit 1 if it did)
    Check {
        /// Print a line-by-line comparison
        #[arg(long)]
        diff: bool,

        /// Ignore the generation timestamp and duration when comparing
        #[arg(long)]
        semantic: bool,
    },

    /// Write a starter configuration file
    Init {
        /// Preset to extend
        #[arg(short, long)]
        preset: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List bundled presets
    Presets,
}

/// Console printer. Color is an explicit setting, never ambient state.
struct Console {
    color: bool,
    silent: bool,
}

impl Console {
    fn line(&self, text: impl AsRef<str>) {
        if !self.silent {
            println!("{}", text.as_ref());
        }
    }

    fn ok(&self, text: &str) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    fn warn(&self, text: &str) -> String {
        if self.color {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn bad(&self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let global = cli.global;

    let options = RunOptions {
        config_path: global.config,
        output: global.output,
        format: global.format,
        timeout_secs: global.timeout,
        silent: global.silent,
        verbose: global.verbose,
        fail_on_error: global.fail_on_error,
    };

    // Setup logging
    truthgen_core::init_tracing(global.json, log_level(&options));

    let console = Console {
        color: !global.no_color && std::env::var_os("NO_COLOR").is_none(),
        silent: options.silent,
    };

    match cli.command.unwrap_or(Commands::Generate) {
        Commands::Generate => cmd_generate(&options, &console).await,
        Commands::Check { diff, semantic } => cmd_check(&options, &console, diff, semantic).await,
        Commands::Init { preset, force } => {
            cmd_init(&options.config_path, preset.as_deref(), force, &console)
        }
        Commands::Presets => {
            for name in bundled_preset_names() {
                println!("{name}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn log_level(options: &RunOptions) -> Level {
    if options.verbose {
        Level::DEBUG
    } else if options.silent {
        Level::ERROR
    } else {
        Level::WARN
    }
}

/// Run every directive and write the report
async fn cmd_generate(options: &RunOptions, console: &Console) -> Result<ExitCode> {
    let pipeline = TruthPipeline::load(options).context("Failed to load configuration")?;
    let summary = pipeline
        .generate()
        .await
        .context("Truth generation failed")?;

    print_summary(&summary, console);

    if summary.has_errors() && pipeline.config().fail_on_error() {
        eprintln!(
            "{}",
            console.bad(&format!("✗ {} essential check(s) failed", summary.errors.len()))
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Regenerate and compare against the persisted report
async fn cmd_check(
    options: &RunOptions,
    console: &Console,
    diff: bool,
    semantic: bool,
) -> Result<ExitCode> {
    let pipeline = TruthPipeline::load(options).context("Failed to load configuration")?;
    let mode = if semantic {
        ChangeMode::Semantic
    } else {
        ChangeMode::Exact
    };
    let outcome = ChangeDetector::new(&pipeline)
        .with_mode(mode)
        .check()
        .await
        .context("Change check failed")?;

    if outcome.first_run {
        console.line(console.warn(&format!(
            "No report at {}; run `truthgen generate` first",
            pipeline.output_path().display()
        )));
        return Ok(ExitCode::FAILURE);
    }

    if diff && outcome.changed {
        for line in outcome.diff() {
            match line {
                DiffLine::Removed { line, text } => {
                    console.line(console.bad(&format!("-{line:>5} {text}")))
                }
                DiffLine::Added { line, text } => {
                    console.line(console.ok(&format!("+{line:>5} {text}")))
                }
            }
        }
    }

    if outcome.changed {
        console.line(console.warn("✗ Truth has changed"));
        Ok(ExitCode::FAILURE)
    } else {
        console.line(console.ok("✓ Truth is up to date"));
        Ok(ExitCode::SUCCESS)
    }
}

/// Write a starter configuration file
fn cmd_init(path: &Path, preset: Option<&str>, force: bool, console: &Console) -> Result<ExitCode> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(name) = preset {
        if !bundled_preset_names().iter().any(|known| *known == name) {
            anyhow::bail!(
                "Unknown preset: {} (available: {})",
                name,
                bundled_preset_names().join(", ")
            );
        }
    }

    std::fs::write(path, starter_config(preset))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    console.line(console.ok(&format!("✓ Wrote {}", path.display())));
    Ok(ExitCode::SUCCESS)
}

fn starter_config(preset: Option<&str>) -> String {
    let extends = preset
        .map(|p| format!("extends: {p}\n"))
        .unwrap_or_default();
    format!(
        r#"# truthgen configuration
version: 1
{extends}project: my-project
output: docs/TRUTH.md

meta:
  timeout_seconds: 30
  fail_on_error: false

# Lists merge with a preset's lists; start a list with "!replace" to discard them.
truth_sources:
  - name: Git Revision
    command: git rev-parse --short HEAD
    essential: true

validations:
  - name: Working Tree Clean
    command: test -z "$(git status --porcelain)" && echo "✓ clean" || echo "✗ uncommitted changes"

working_examples:
  - name: Regenerate
    description: Refresh this document
    command: echo "truthgen generate"

platform:
  - name: OS
    command: uname -sr
"#
    )
}

fn print_summary(summary: &GenerationSummary, console: &Console) {
    console.line(format!(
        "{} {} ({}, {} commands, {}ms)",
        console.ok("✓ Wrote"),
        summary.output_path.display(),
        summary.format,
        summary.commands,
        summary.duration_ms
    ));
    if summary.validations_total > 0 {
        console.line(format!(
            "  {}/{} validations passed",
            summary.validations_passed, summary.validations_total
        ));
    }
    if summary.has_errors() {
        console.line(console.warn(&format!("  ⚠ {} warning(s)", summary.errors.len())));
        for error in &summary.errors {
            console.line(format!(
                "    - [{}] {}",
                error.kind.as_str(),
                error.source
            ));
        }
    }
}
