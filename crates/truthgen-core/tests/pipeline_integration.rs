//! Integration tests for the full resolve → generate → persist → check cycle.
#![cfg(unix)]

use std::path::{Path, PathBuf};

use truthgen_core::{
    ChangeDetector, ChangeMode, DiffLine, OutputFormat, RunOptions, TruthError, TruthPipeline,
};

fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join(".truth.yml");
    std::fs::write(&path, body).expect("write config");
    path
}

fn options(config_path: PathBuf, output: PathBuf) -> RunOptions {
    RunOptions {
        config_path,
        output: Some(output),
        ..Default::default()
    }
}

/// Test: essential echo source renders as a labelled block with no errors
#[tokio::test]
async fn test_end_to_end_markdown_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "project: demo\ntruth_sources:\n  - name: Echo\n    command: echo hi\n    essential: true\n",
    );
    let output = dir.path().join("docs/TRUTH.md");

    let pipeline = TruthPipeline::load(&options(config, output.clone())).expect("load");
    let summary = pipeline.generate().await.expect("generate");

    assert!(summary.errors.is_empty(), "errors: {:?}", summary.errors);
    assert_eq!(summary.format, OutputFormat::Markdown);
    assert_eq!(summary.commands, 1);

    let report = std::fs::read_to_string(&output).expect("report written");
    assert!(report.starts_with("# demo Truth Report"));
    assert!(report.contains("### Echo [ESSENTIAL]"));
    assert!(report.contains("```\n$ echo hi\nhi\n```"));
}

/// Test: a config without truth_sources yields no `sources` field
#[tokio::test]
async fn test_absent_sources_absent_from_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "platform:\n  - name: Shell\n    command: echo sh\n",
    );
    let output = dir.path().join("truth.json");

    let pipeline = TruthPipeline::load(&options(config, output.clone())).expect("load");
    pipeline.generate().await.expect("generate");

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert!(raw.get("sources").is_none());
    assert_eq!(raw["platform"][0]["output"], "sh");
    assert_eq!(raw["errors"], serde_json::json!([]));
}

/// Test: failing essential source and required validation land in the error list
#[tokio::test]
async fn test_failures_recorded_but_report_still_written() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
truth_sources:
  - name: Missing Tool
    command: definitely-not-a-real-binary-xyz --version
    essential: true
validations:
  - name: Tests
    command: echo "FAIL 2 tests"; exit 1
    required: true
  - name: Format
    command: echo "✓ formatted"
  - name: Pattern
    command: 'echo "test result: ok. 3 passed"'
    successPattern: "test result: ok"
"#,
    );
    let output = dir.path().join("TRUTH.md");

    let pipeline = TruthPipeline::load(&options(config, output.clone())).expect("load");
    let summary = pipeline.generate().await.expect("generate");

    assert_eq!(summary.errors.len(), 2);
    assert_eq!(summary.validations_passed, 2);
    assert_eq!(summary.validations_total, 3);

    let report = std::fs::read_to_string(&output).unwrap();
    assert!(report.contains("## ⚠️ Warnings"));
    assert!(report.contains("**2/3 validations passed**"));
}

/// Test: fail-fast aborts on the first command failure and writes nothing
#[tokio::test]
async fn test_fail_fast_raises() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "meta:\n  fail_on_error: true\ntruth_sources:\n  - name: Broken\n    command: exit 42\n",
    );
    let output = dir.path().join("TRUTH.md");

    let pipeline = TruthPipeline::load(&options(config, output.clone())).expect("load");
    let err = pipeline.generate().await.unwrap_err();

    match err {
        TruthError::CommandFailed { message, .. } => assert_eq!(message, "[EXIT CODE: 42]"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!output.exists());
}

/// Test: per-directive timeout produces the timeout sentinel
#[tokio::test]
async fn test_directive_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "benchmarks:\n  - name: Slow\n    command: sleep 5\n    timeout: 1\n",
    );
    let output = dir.path().join("truth.json");

    let pipeline = TruthPipeline::load(&options(config, output)).expect("load");
    let assembly = pipeline.assemble().await.expect("assemble");
    let benchmarks = assembly.tree.benchmarks.unwrap();
    assert!(benchmarks[0].output.contains("[TIMEOUT"));
}

/// Test: first check without a prior report is "changed" and runs nothing
#[tokio::test]
async fn test_first_check_reports_changed() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let config = write_config(
        dir.path(),
        &format!(
            "truth_sources:\n  - name: Touch\n    command: touch {}\n",
            marker.display()
        ),
    );
    let output = dir.path().join("TRUTH.md");

    let pipeline = TruthPipeline::load(&options(config, output.clone())).expect("load");
    let outcome = ChangeDetector::new(&pipeline).check().await.expect("check");

    assert!(outcome.changed);
    assert!(outcome.first_run);
    assert!(outcome.diff().is_empty());
    assert!(!marker.exists(), "no command should run on first check");
    assert!(!output.exists());
}

/// Test: identical commands still register as changed because the timestamp moves
#[tokio::test]
async fn test_rerun_changed_by_timestamp_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "truth_sources:\n  - name: Echo\n    command: echo stable\n",
    );
    let output = dir.path().join("truth.json");

    let pipeline = TruthPipeline::load(&options(config, output)).expect("load");
    pipeline.generate().await.expect("generate");

    let exact = ChangeDetector::new(&pipeline).check().await.expect("check");
    assert!(exact.changed);
    assert!(!exact.first_run);
    assert!(exact
        .diff()
        .iter()
        .any(|d| matches!(d, DiffLine::Added { text, .. } if text.contains("generated"))));

    let semantic = ChangeDetector::new(&pipeline)
        .with_mode(ChangeMode::Semantic)
        .check()
        .await
        .expect("check");
    assert!(!semantic.changed);
}

/// Test: project-local preset is inherited and overridden
#[tokio::test]
async fn test_project_preset_inheritance() {
    let dir = tempfile::tempdir().unwrap();
    let presets = dir.path().join(".truth/presets");
    std::fs::create_dir_all(&presets).unwrap();
    std::fs::write(
        presets.join("team.yaml"),
        "project: team\nplatform:\n  - name: Base\n    command: echo base\n",
    )
    .unwrap();
    let config = write_config(
        dir.path(),
        "extends: team\nproject: app\nplatform:\n  - name: Own\n    command: echo own\n",
    );
    let output = dir.path().join("truth.html");

    let pipeline = TruthPipeline::load(&options(config, output.clone())).expect("load");
    assert_eq!(pipeline.format(), OutputFormat::Html);
    pipeline.generate().await.expect("generate");

    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("<title>app Truth Report</title>"));
    let base = html.find("<li>**Base**: base</li>").expect("base probe");
    let own = html.find("<li>**Own**: own</li>").expect("own probe");
    assert!(base < own);
}

/// Test: missing config file is a fatal ConfigNotFound
#[tokio::test]
async fn test_missing_config() {
    let dir = tempfile::tempdir().unwrap();
    let result = TruthPipeline::load(&options(
        dir.path().join("nope.yml"),
        dir.path().join("TRUTH.md"),
    ));
    assert!(matches!(result, Err(TruthError::ConfigNotFound { .. })));
}
