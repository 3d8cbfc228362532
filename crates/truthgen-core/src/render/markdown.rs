//! Markdown report, the default human-facing format.

use std::fmt::Write as _;

use super::{RenderOptions, GENERATED_MARKER};
use crate::model::{ErrorRecord, ExecutionResult, ResultTree, ValidationResult};

/// Category label for truth-sources that declare none.
const UNCATEGORIZED: &str = "General";

/// Render the full markdown report.
pub fn render_markdown(tree: &ResultTree, errors: &[ErrorRecord], options: &RenderOptions) -> String {
    let mut out = String::new();
    write_header(&mut out, tree);

    if !errors.is_empty() {
        write_warnings(&mut out, errors);
    }
    if let Some(validations) = tree.validations.as_deref() {
        let _ = writeln!(out, "## Summary\n");
        let _ = writeln!(
            out,
            "**{}/{} validations passed**\n",
            tree.passed_count(),
            validations.len()
        );
    }
    if let Some(sources) = tree.sources.as_deref() {
        write_sources(&mut out, sources, options);
    }
    if let Some(validations) = tree.validations.as_deref() {
        write_validations(&mut out, validations, options);
    }
    if let Some(examples) = tree.examples.as_deref() {
        write_examples(&mut out, examples);
    }
    if let Some(benchmarks) = tree.benchmarks.as_deref() {
        write_benchmarks(&mut out, benchmarks);
    }
    if let Some(platform) = tree.platform.as_deref() {
        write_platform(&mut out, platform);
    }

    let _ = writeln!(out, "---\n");
    let _ = writeln!(
        out,
        "*Generated by truthgen v{} from `{}`*",
        tree.meta.version, options.config_label
    );
    out
}

fn write_header(out: &mut String, tree: &ResultTree) {
    let meta = &tree.meta;
    let _ = writeln!(out, "# {} Truth Report\n", meta.project);
    let _ = writeln!(
        out,
        "> {}{} | Duration: {}ms | truthgen v{}\n",
        GENERATED_MARKER,
        meta.generated.format("%Y-%m-%d %H:%M:%S UTC"),
        meta.duration_ms,
        meta.version
    );
}

fn write_warnings(out: &mut String, errors: &[ErrorRecord]) {
    let _ = writeln!(out, "## ⚠️ Warnings\n");
    for error in errors {
        let _ = writeln!(
            out,
            "- **{}** `{}`: {}",
            error.kind.as_str(),
            error.source,
            single_line(&error.message)
        );
    }
    out.push('\n');
}

fn write_sources(out: &mut String, sources: &[ExecutionResult], options: &RenderOptions) {
    let _ = writeln!(out, "## Truth Sources\n");

    let mut groups: Vec<(&str, Vec<&ExecutionResult>)> = Vec::new();
    for source in sources {
        let category = source.category.as_deref().unwrap_or(UNCATEGORIZED);
        match groups.iter_mut().find(|(name, _)| *name == category) {
            Some((_, members)) => members.push(source),
            None => groups.push((category, vec![source])),
        }
    }

    let show_categories = groups.len() > 1;
    let heading = if show_categories { "####" } else { "###" };
    for (category, members) in groups {
        if show_categories {
            let _ = writeln!(out, "### {category}\n");
        }
        for source in members {
            let badge = if source.essential { " [ESSENTIAL]" } else { "" };
            let _ = writeln!(out, "{heading} {}{badge}\n", source.name);

            let body = format!(
                "$ {}\n{}",
                source.command,
                truncate_lines(&source.output, options.max_output_lines)
            );
            write_fenced(out, "", &body);
        }
    }
}

fn write_validations(out: &mut String, validations: &[ValidationResult], options: &RenderOptions) {
    let _ = writeln!(out, "## Validations\n");
    let _ = writeln!(out, "| Status | Check | Output | Required |");
    let _ = writeln!(out, "|--------|-------|--------|----------|");
    for validation in validations {
        let glyph = if validation.passed { "✅" } else { "❌" };
        let required = if validation.result.required { "Yes" } else { "No" };
        let _ = writeln!(
            out,
            "| {glyph} | {} | {} | {required} |",
            escape_cell(&validation.result.name),
            escape_cell(&excerpt(&validation.result.output, options.excerpt_width)),
        );
    }
    out.push('\n');
}

fn write_examples(out: &mut String, examples: &[ExecutionResult]) {
    let _ = writeln!(out, "## Working Examples\n");
    let mut body = String::new();
    for (i, example) in examples.iter().enumerate() {
        if i > 0 {
            body.push_str("\n\n");
        }
        let _ = write!(body, "# {}", example.name);
        if let Some(description) = example.description.as_deref() {
            for line in description.lines() {
                let _ = write!(body, "\n# {line}");
            }
        }
        if !example.output.is_empty() {
            let _ = write!(body, "\n{}", example.output);
        }
    }
    write_fenced(out, "bash", &body);
}

fn write_benchmarks(out: &mut String, benchmarks: &[ExecutionResult]) {
    let _ = writeln!(out, "## Benchmarks\n");
    let _ = writeln!(out, "| Benchmark | Result |");
    let _ = writeln!(out, "|-----------|--------|");
    for benchmark in benchmarks {
        let value = match benchmark.unit.as_deref() {
            Some(unit) => format!("{} {unit}", single_line(&benchmark.output)),
            None => single_line(&benchmark.output),
        };
        let _ = writeln!(
            out,
            "| {} | {} |",
            escape_cell(&benchmark.name),
            escape_cell(&value)
        );
    }
    out.push('\n');
}

fn write_platform(out: &mut String, platform: &[ExecutionResult]) {
    let _ = writeln!(out, "## Platform\n");
    for probe in platform {
        let _ = writeln!(out, "- **{}**: {}", probe.name, single_line(&probe.output));
    }
    out.push('\n');
}

/// Write `body` inside a fence longer than any backtick run it contains.
fn write_fenced(out: &mut String, lang: &str, body: &str) {
    let fence = fence_for(body);
    let _ = writeln!(out, "{fence}{lang}");
    let _ = writeln!(out, "{body}");
    let _ = writeln!(out, "{fence}\n");
}

pub(crate) fn fence_for(body: &str) -> String {
    let longest = body
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Keep the first `max` lines and note how many were dropped.
pub(crate) fn truncate_lines(text: &str, max: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max {
        return text.to_string();
    }
    let mut kept = lines[..max].join("\n");
    let _ = write!(kept, "\n... ({} more lines truncated)", lines.len() - max);
    kept
}

/// Flatten to one line and cap at `width` characters, ellipsis included.
pub(crate) fn excerpt(text: &str, width: usize) -> String {
    let flat = single_line(text);
    if flat.chars().count() <= width {
        return flat;
    }
    let mut cut: String = flat.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Directive;
    use crate::render::fixtures;

    fn render_default(tree: &ResultTree, errors: &[ErrorRecord]) -> String {
        render_markdown(tree, errors, &RenderOptions::default())
    }

    #[test]
    fn test_essential_source_header_and_block() {
        let md = render_default(&fixtures::tree(), &[]);
        assert!(md.contains("### Echo [ESSENTIAL]\n"));
        assert!(md.contains("```\n$ echo hi\nhi\n```\n"));
        assert!(!md.contains("## ⚠️ Warnings"));
    }

    #[test]
    fn test_warnings_and_summary() {
        let md = render_default(&fixtures::tree(), &fixtures::errors());
        assert!(md.contains("## ⚠️ Warnings\n\n- **validation** `Lint`: FAIL | 3 warnings\n"));
        assert!(md.contains("**1/2 validations passed**"));
    }

    #[test]
    fn test_validation_table_escapes_pipes() {
        let md = render_default(&fixtures::tree(), &[]);
        assert!(md.contains("| ✅ | Build | ✓ builds | Yes |"));
        assert!(md.contains("| ❌ | Lint | FAIL \\| 3 warnings | No |"));
    }

    #[test]
    fn test_categories_only_when_multiple() {
        let mut tree = fixtures::tree();
        tree.sources = Some(vec![
            ExecutionResult::from_directive(
                &Directive::new("Rustc", "rustc -V").with_category("Toolchain"),
                "rustc 1.80".to_string(),
            ),
            ExecutionResult::from_directive(&Directive::new("Head", "git rev-parse HEAD"), "abc".into()),
            ExecutionResult::from_directive(
                &Directive::new("Cargo", "cargo -V").with_category("Toolchain"),
                "cargo 1.80".to_string(),
            ),
        ]);
        let md = render_default(&tree, &[]);
        let toolchain = md.find("### Toolchain").unwrap();
        let general = md.find("### General").unwrap();
        let cargo = md.find("#### Cargo").unwrap();
        assert!(toolchain < cargo && cargo < general);

        tree.sources = Some(vec![ExecutionResult::from_directive(
            &Directive::new("Rustc", "rustc -V").with_category("Toolchain"),
            "rustc 1.80".to_string(),
        )]);
        let md = render_default(&tree, &[]);
        assert!(!md.contains("### Toolchain"));
        assert!(md.contains("### Rustc\n"));
    }

    #[test]
    fn test_long_output_truncated() {
        let output: Vec<String> = (1..=105).map(|i| format!("line {i}")).collect();
        let truncated = truncate_lines(&output.join("\n"), 100);
        assert!(truncated.contains("line 100"));
        assert!(!truncated.contains("line 101"));
        assert!(truncated.ends_with("... (5 more lines truncated)"));
    }

    #[test]
    fn test_excerpt_caps_and_flattens() {
        let long = "x".repeat(80);
        let cut = excerpt(&long, 50);
        assert_eq!(cut, format!("{}...", "x".repeat(47)));
        assert_eq!(cut.chars().count(), 50);
        assert_eq!(excerpt("a\nb", 50), "a b");
    }

    #[test]
    fn test_fence_outgrows_backticks() {
        assert_eq!(fence_for("plain"), "```");
        assert_eq!(fence_for("has ``` inside"), "````");
    }

    #[test]
    fn test_examples_benchmarks_platform() {
        let mut tree = fixtures::tree();
        let mut example = Directive::new("Check", "echo 'truthgen check'");
        example.description = Some("Detect drift".to_string());
        tree.examples = Some(vec![ExecutionResult::from_directive(&example, "truthgen check".into())]);
        let mut bench = Directive::new("Build", "time-build");
        bench.unit = Some("s".to_string());
        tree.benchmarks = Some(vec![ExecutionResult::from_directive(&bench, "12.5".into())]);
        tree.platform = Some(vec![ExecutionResult::from_directive(
            &Directive::new("OS", "uname"),
            "Linux".into(),
        )]);

        let md = render_default(&tree, &[]);
        assert!(md.contains("```bash\n# Check\n# Detect drift\ntruthgen check\n```"));
        assert!(md.contains("| Build | 12.5 s |"));
        assert!(md.contains("- **OS**: Linux\n"));
    }

    #[test]
    fn test_footer_names_config() {
        let md = render_markdown(&fixtures::tree(), &[], &RenderOptions::new("ci/.truth.yml"));
        assert!(md.trim_end().ends_with("*Generated by truthgen v0.3.1 from `ci/.truth.yml`*"));
    }
}
