//! Error types for the migration library.

use thiserror::Error;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for scripts that cannot be translated to the target vendor.
pub const EXIT_TRANSLATION_ERROR: u8 = 2;
/// Exit code for statements rejected by the target database.
pub const EXIT_EXECUTION_ERROR: u8 = 3;
/// Exit code for unrecoverable failures (lost connection, fatal marker).
pub const EXIT_FATAL_ERROR: u8 = 4;
/// Exit code for cancelled runs.
pub const EXIT_CANCELLED: u8 = 5;
/// Exit code for connection failures.
pub const EXIT_CONNECTION_ERROR: u8 = 6;
/// Exit code for IO failures (missing script or config file).
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A statement uses a construct that has no rule for the target vendor.
    #[error("Cannot translate {construct} for {vendor}: {reason}\n  Statement: {statement}")]
    Translation {
        statement: String,
        construct: String,
        vendor: String,
        reason: String,
    },

    /// The target database rejected a translated statement.
    #[error("Statement {} failed: {message}\n  Statement: {statement}", .index + 1)]
    Execution {
        index: usize,
        statement: String,
        message: String,
    },

    /// Unrecoverable failure that must halt the hosting application.
    #[error("Fatal error at statement {} ({applied} statement(s) already applied): {message}\n  Statement: {statement}", .index + 1)]
    Fatal {
        index: usize,
        statement: String,
        message: String,
        applied: usize,
    },

    /// Connection could not be established or verified.
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// Migration was cancelled (SIGINT, etc.)
    #[error("Migration cancelled")]
    Cancelled,

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Translation error.
    pub fn translation(
        statement: impl Into<String>,
        construct: impl Into<String>,
        vendor: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MigrateError::Translation {
            statement: statement.into(),
            construct: construct.into(),
            vendor: vendor.into(),
            reason: reason.into(),
        }
    }

    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl std::fmt::Display, context: impl Into<String>) -> Self {
        MigrateError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Whether the error must halt the host's startup sequence.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MigrateError::Fatal { .. })
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => EXIT_CONFIG_ERROR,
            MigrateError::Translation { .. } => EXIT_TRANSLATION_ERROR,
            MigrateError::Execution { .. } => EXIT_EXECUTION_ERROR,
            MigrateError::Fatal { .. } => EXIT_FATAL_ERROR,
            MigrateError::Cancelled => EXIT_CANCELLED,
            MigrateError::Connection { .. } => EXIT_CONNECTION_ERROR,
            MigrateError::Io(_) | MigrateError::Json(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
