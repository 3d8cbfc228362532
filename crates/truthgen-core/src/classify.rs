//! Content-based classification of captured output.
//!
//! Exit codes are already folded into sentinels by the executor, so every
//! decision here is made on text alone.

use regex::Regex;
use tracing::warn;

/// Bracketed sentinel prefixes produced by the executor.
const SENTINEL_PREFIXES: &[&str] = &["[TIMEOUT", "[KILLED", "[STDERR", "[EXIT CODE", "[ERROR"];

/// Lower-cased phrases that indicate a broken environment rather than output.
const ERROR_PHRASES: &[&str] = &[
    "command not found",
    "no such file",
    "permission denied",
    "cannot find",
    "fatal:",
];

const FAILURE_GLYPHS: &[&str] = &["✗", "❌", "✘"];
const SUCCESS_GLYPHS: &[&str] = &["✓", "✅", "✔"];

/// Whether `output` signals a failed or unusable command.
pub fn is_error(output: &str) -> bool {
    if SENTINEL_PREFIXES.iter().any(|p| output.contains(p)) {
        return true;
    }
    let lower = output.to_lowercase();
    ERROR_PHRASES.iter().any(|p| lower.contains(p))
}

/// Decide whether a validation passed.
///
/// Priority: explicit failure markers, then the error taxonomy, then the
/// configured success pattern, then the success-marker heuristic.
pub fn validation_passed(output: &str, success_pattern: Option<&str>) -> bool {
    if FAILURE_GLYPHS.iter().any(|g| output.contains(g)) || output.contains("FAIL") {
        return false;
    }
    if is_error(output) {
        return false;
    }
    if let Some(pattern) = success_pattern {
        return match Regex::new(pattern) {
            Ok(re) => re.is_match(output),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Invalid success pattern; treating as failed");
                false
            }
        };
    }
    if SUCCESS_GLYPHS.iter().any(|g| output.contains(g))
        || output.contains("PASS")
        || output.contains("OK")
    {
        return true;
    }
    !output.trim().is_empty()
}

/// Strip an `echo "..."` / `echo '...'` wrapper and surrounding quotes.
pub fn unwrap_example(output: &str) -> String {
    let mut text = output.trim();
    if let Some(rest) = text.strip_prefix("echo ") {
        text = rest.trim_start();
    }
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            text = &text[1..text.len() - 1];
            break;
        }
    }
    text.to_string()
}
