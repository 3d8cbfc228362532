//! Truth assembly: run every section's directives and build the result tree.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use crate::classify::{is_error, unwrap_example, validation_passed};
use crate::config::{Directive, TruthConfig};
use crate::error::Result;
use crate::executor::CommandRunner;
use crate::model::{ErrorKind, ErrorRecord, ExecutionResult, ReportMeta, ResultTree, ValidationResult};

/// Report sections, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Sources,
    Validations,
    Examples,
    Benchmarks,
    Platform,
}

/// Closed dispatch table; sections are always processed in this order.
pub const SECTIONS: [Section; 5] = [
    Section::Sources,
    Section::Validations,
    Section::Examples,
    Section::Benchmarks,
    Section::Platform,
];

impl Section {
    /// Configuration key holding the directive list.
    pub fn key(&self) -> &'static str {
        match self {
            Section::Sources => "truth_sources",
            Section::Validations => "validations",
            Section::Examples => "working_examples",
            Section::Benchmarks => "benchmarks",
            Section::Platform => "platform",
        }
    }

    /// Field of the result tree the section populates.
    pub fn result_field(&self) -> &'static str {
        match self {
            Section::Sources => "sources",
            Section::Validations => "validations",
            Section::Examples => "examples",
            Section::Benchmarks => "benchmarks",
            Section::Platform => "platform",
        }
    }

    fn directives<'a>(&self, config: &'a TruthConfig) -> Option<&'a [Directive]> {
        match self {
            Section::Sources => config.truth_sources.as_deref(),
            Section::Validations => config.validations.as_deref(),
            Section::Examples => config.working_examples.as_deref(),
            Section::Benchmarks => config.benchmarks.as_deref(),
            Section::Platform => config.platform.as_deref(),
        }
    }
}

/// Output of one `generate` call, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub tree: ResultTree,
    pub errors: Vec<ErrorRecord>,
}

/// Drives the section processors against a [`CommandRunner`].
#[derive(Clone)]
pub struct TruthAssembler {
    runner: Arc<dyn CommandRunner>,
}

impl TruthAssembler {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Run every configured section, strictly in order, one command at a time.
    ///
    /// Only fails when the runner raises (fail-fast mode).
    pub async fn generate(&self, config: &TruthConfig) -> Result<Assembly> {
        let start = Instant::now();
        let generated = Utc::now();
        let mut tree = ResultTree::new(ReportMeta {
            project: config.project_name(),
            generated,
            version: crate::VERSION.to_string(),
            duration_ms: 0,
        });
        let mut errors = Vec::new();
        let default_timeout = config.default_timeout();

        for section in SECTIONS {
            let Some(directives) = section.directives(config) else {
                continue;
            };
            info!(section = section.key(), count = directives.len(), "Processing section");

            match section {
                Section::Sources => {
                    let mut results = Vec::with_capacity(directives.len());
                    for directive in directives {
                        let output = self.run(directive, default_timeout).await?;
                        if directive.essential && is_error(&output) {
                            warn!(source = %directive.name, "Essential truth source failed");
                            errors.push(ErrorRecord {
                                kind: ErrorKind::Essential,
                                source: directive.name.clone(),
                                message: output.clone(),
                            });
                        }
                        results.push(ExecutionResult::from_directive(directive, output));
                    }
                    tree.sources = Some(results);
                }
                Section::Validations => {
                    let mut results = Vec::with_capacity(directives.len());
                    for directive in directives {
                        let output = self.run(directive, default_timeout).await?;
                        let passed =
                            validation_passed(&output, directive.success_pattern.as_deref());
                        if directive.required && !passed {
                            warn!(validation = %directive.name, "Required validation failed");
                            errors.push(ErrorRecord {
                                kind: ErrorKind::Validation,
                                source: directive.name.clone(),
                                message: output.clone(),
                            });
                        }
                        results.push(ValidationResult {
                            result: ExecutionResult::from_directive(directive, output),
                            passed,
                        });
                    }
                    tree.validations = Some(results);
                }
                Section::Examples => {
                    let mut results = Vec::with_capacity(directives.len());
                    for directive in directives {
                        let output = self.run(directive, default_timeout).await?;
                        results.push(ExecutionResult::from_directive(
                            directive,
                            unwrap_example(&output),
                        ));
                    }
                    tree.examples = Some(results);
                }
                Section::Benchmarks => {
                    tree.benchmarks = Some(self.run_raw(directives, default_timeout).await?);
                }
                Section::Platform => {
                    tree.platform = Some(self.run_raw(directives, default_timeout).await?);
                }
            }
        }

        tree.meta.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            commands = tree.command_count(),
            errors = errors.len(),
            duration_ms = tree.meta.duration_ms,
            "Truth assembled"
        );

        Ok(Assembly { tree, errors })
    }

    async fn run(&self, directive: &Directive, default_timeout: u64) -> Result<String> {
        let timeout = directive.timeout.unwrap_or(default_timeout);
        info!(directive = %directive.name, timeout_secs = timeout, "Running");
        self.runner.run(&directive.command, timeout).await
    }

    async fn run_raw(
        &self,
        directives: &[Directive],
        default_timeout: u64,
    ) -> Result<Vec<ExecutionResult>> {
        let mut results = Vec::with_capacity(directives.len());
        for directive in directives {
            let output = self.run(directive, default_timeout).await?;
            results.push(ExecutionResult::from_directive(directive, output));
        }
        Ok(results)
    }
}
