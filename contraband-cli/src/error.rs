//! CLI-specific error types and exit code mapping

use contraband_core::error::ContrabandError;
use contraband_scanner::ScannerError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The scan target does not exist or contains no files.
    #[error("scan root error: {0}")]
    Root(String),

    /// The scan completed and reported policy violations.
    #[error("found {0} issue(s)")]
    IssuesFound(usize),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                      |
    /// |------|------------------------------|
    /// | 0    | Success                      |
    /// | 1    | General / command error      |
    /// | 2    | Configuration error          |
    /// | 3    | Scan root missing or empty   |
    /// | 4    | Scan found issues            |
    /// | 10   | IO error                     |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Root(_) => 3,
            Self::IssuesFound(_) => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<ContrabandError> for CliError {
    fn from(e: ContrabandError) -> Self {
        match e {
            ContrabandError::Config(inner) => Self::Config(inner.to_string()),
            ContrabandError::Root(inner) => Self::Root(inner.to_string()),
            ContrabandError::Io(inner) => Self::Io(inner),
            other => Self::Command(other.to_string()),
        }
    }
}

impl From<ScannerError> for CliError {
    fn from(e: ScannerError) -> Self {
        match e {
            ScannerError::Config { field, reason } => Self::Config(format!("{field}: {reason}")),
            ScannerError::Root(inner) => Self::Root(inner.to_string()),
            other => Self::Command(other.to_string()),
        }
    }
}
