//! Error taxonomy for the truth-assembly pipeline.

use std::path::PathBuf;

/// Pipeline errors.
///
/// Command-level failures are normally captured as sentinel text inside the
/// report; `CommandFailed` is only raised when fail-fast mode is enabled.
#[derive(Debug, thiserror::Error)]
pub enum TruthError {
    #[error("config not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("failed to parse config {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    #[error("command failed: {command}\n{message}")]
    CommandFailed { command: String, message: String },

    #[error("failed to write report {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read report {}: {source}", path.display())]
    ReportRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("render error: {0}")]
    Render(#[from] serde_json::Error),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, TruthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_display() {
        let err = TruthError::ConfigNotFound {
            path: PathBuf::from(".truth.yml"),
        };
        assert_eq!(err.to_string(), "config not found: .truth.yml");
    }

    #[test]
    fn test_command_failed_embeds_sentinel() {
        let err = TruthError::CommandFailed {
            command: "sleep 5".to_string(),
            message: "[TIMEOUT: Command exceeded 1s]".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("sleep 5"));
        assert!(msg.contains("[TIMEOUT: Command exceeded 1s]"));
    }

    #[test]
    fn test_output_write_keeps_source() {
        let err = TruthError::OutputWrite {
            path: PathBuf::from("/readonly/TRUTH.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/readonly/TRUTH.md"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
