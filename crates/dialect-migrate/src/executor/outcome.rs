//! Per-statement results of a script execution.

use serde::Serialize;

use crate::error::{MigrateError, Result};

/// Progress update sent after each statement that succeeds.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    /// 0-based position of the statement in the script.
    pub index: usize,
    /// Number of statements in the script.
    pub total: usize,
    /// The statement that was applied.
    pub statement: String,
}

/// Outcome of one attempted statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatementStatus {
    Succeeded { rows_affected: u64 },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementOutcome {
    /// 0-based position in the script.
    pub index: usize,
    pub sql: String,
    #[serde(flatten)]
    pub status: StatementStatus,
}

impl StatementOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, StatementStatus::Succeeded { .. })
    }

    /// Error text, if the statement failed.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            StatementStatus::Failed { error } => Some(error),
            StatementStatus::Succeeded { .. } => None,
        }
    }
}

/// Result of running a script.
///
/// Holds one entry per attempted statement, in script order. Statements
/// after a stop (error or cancellation) are not attempted and have no entry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionOutcome {
    /// Number of statements in the script.
    pub total: usize,

    /// Attempted statements, in order.
    pub statements: Vec<StatementOutcome>,

    /// Execution stopped at the first failure.
    pub stopped_on_error: bool,

    /// Execution stopped because the run was cancelled.
    pub cancelled: bool,
}

impl ExecutionOutcome {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn succeeded(&self) -> usize {
        self.statements.iter().filter(|s| s.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.statements.len() - self.succeeded()
    }

    pub fn not_attempted(&self) -> usize {
        self.total.saturating_sub(self.statements.len())
    }

    /// Every statement ran and none failed.
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.not_attempted() == 0 && !self.cancelled
    }

    pub fn failures(&self) -> impl Iterator<Item = &StatementOutcome> {
        self.statements.iter().filter(|s| !s.is_success())
    }

    /// Turn a cancelled run or the first failed statement into an error.
    pub fn into_result(self) -> Result<Self> {
        if self.cancelled {
            return Err(MigrateError::Cancelled);
        }
        if let Some(failure) = self.failures().next() {
            return Err(MigrateError::Execution {
                index: failure.index,
                statement: failure.sql.clone(),
                message: failure.error().unwrap_or_default().to_string(),
            });
        }
        Ok(self)
    }

    pub(crate) fn record(&mut self, index: usize, sql: String, status: StatementStatus) {
        self.statements.push(StatementOutcome { index, sql, status });
    }
}
