//! Core traits for executing translated scripts.
//!
//! - [`ScriptConnection`]: One exclusive database session that runs raw
//!   statements in the target dialect.
//!
//! Drivers under `drivers/` implement the trait; the executor only sees the
//! trait, so it can be tested with an in-memory implementation.

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

use super::vendor::Vendor;

/// How a statement failed, as reported by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The engine rejected the statement; the session is still usable.
    Rejected,
    /// The session is gone (network drop, server shutdown). Nothing more can run.
    ConnectionLost,
}

/// A failed statement execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementError {
    pub kind: FailureKind,
    pub message: String,
}

impl StatementError {
    /// The engine rejected the statement.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Rejected,
            message: message.into(),
        }
    }

    /// The connection was lost while running the statement.
    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::ConnectionLost,
            message: message.into(),
        }
    }

    pub fn is_connection_lost(&self) -> bool {
        self.kind == FailureKind::ConnectionLost
    }
}

impl fmt::Display for StatementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Rejected => f.write_str(&self.message),
            FailureKind::ConnectionLost => write!(f, "connection lost: {}", self.message),
        }
    }
}

/// A database session able to run single SQL statements.
///
/// The executor borrows the connection mutably for a whole script, so an
/// implementation never sees concurrent calls.
#[async_trait]
pub trait ScriptConnection: Send {
    /// Dialect the connection expects statements in.
    fn vendor(&self) -> Vendor;

    /// Run one statement (no trailing delimiter) and return the affected row count.
    async fn execute_statement(&mut self, sql: &str) -> std::result::Result<u64, StatementError>;

    /// Check the session is alive.
    async fn ping(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_error_display() {
        assert_eq!(
            StatementError::rejected("duplicate column").to_string(),
            "duplicate column"
        );
        let lost = StatementError::connection_lost("broken pipe");
        assert!(lost.is_connection_lost());
        assert_eq!(lost.to_string(), "connection lost: broken pipe");
    }
}
