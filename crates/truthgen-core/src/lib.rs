//! truthgen core library
//!
//! Documentation that cannot drift: run a declared list of shell commands,
//! assemble their output into a result tree, and render it as markdown, JSON
//! or HTML.
//!
//! - [`config`]: configuration model, preset inheritance, deep merge
//! - [`executor`]: shell execution under a deadline with failure sentinels
//! - [`assembler`]: section processing into a [`ResultTree`]
//! - [`render`]: markdown / JSON / HTML output
//! - [`change`]: comparison against the previously persisted report

pub mod assembler;
pub mod change;
pub mod classify;
pub mod config;
pub mod error;
pub mod executor;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod telemetry;

pub use assembler::{Assembly, Section, TruthAssembler, SECTIONS};
pub use change::{positional_diff, ChangeDetector, ChangeMode, ChangeOutcome, DiffLine};
pub use classify::{is_error, unwrap_example, validation_passed};
pub use config::{
    deep_merge, ConfigOverrides, ConfigResolver, Directive, OutputFormat, TruthConfig,
    DEFAULT_CONFIG_FILE, DEFAULT_OUTPUT, REPLACE_SENTINEL,
};
pub use error::{Result, TruthError};
pub use executor::{CommandFailure, CommandRunner, ShellExecutor};
pub use model::{ErrorKind, ErrorRecord, ExecutionResult, ReportMeta, ResultTree, ValidationResult};
pub use pipeline::{write_report, GenerationSummary, RunOptions, TruthPipeline};
pub use render::{render, RenderOptions};
pub use telemetry::init_tracing;

/// truthgen version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
