//! Script execution against a live connection.
//!
//! Statements run one at a time, strictly in script order, on a single
//! connection. A rejected statement is recorded and, depending on the error
//! policy, either stops the run or is skipped. Two kinds of failure are
//! unrecoverable regardless of policy and come back as
//! [`MigrateError::Fatal`]:
//!
//! - the connection is lost mid-script
//! - a statement whose leading comment carries the fatal marker
//!   (`-- FATAL` by default) fails
//!
//! ```rust,ignore
//! let executor = ScriptExecutor::new(false).with_progress(tx);
//! let outcome = executor.execute(&mut conn, script, &cancel).await?;
//! println!("{} ok, {} failed", outcome.succeeded(), outcome.failed());
//! ```

mod outcome;

pub use outcome::{ExecutionOutcome, ProgressUpdate, StatementOutcome, StatementStatus};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::ScriptConnection;
use crate::dialect::lexer::{tokenize, TokenKind};
use crate::error::{MigrateError, Result};
use crate::script;

/// Default marker that makes a statement's failure unrecoverable.
pub const DEFAULT_FATAL_MARKER: &str = "FATAL";

/// Runs split scripts on a [`ScriptConnection`].
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    stop_on_error: bool,
    fatal_marker: String,
    progress_tx: Option<mpsc::Sender<ProgressUpdate>>,
}

impl ScriptExecutor {
    /// Create an executor. With `stop_on_error` the first rejected statement
    /// ends the run; otherwise failures are recorded and execution continues.
    pub fn new(stop_on_error: bool) -> Self {
        Self {
            stop_on_error,
            fatal_marker: DEFAULT_FATAL_MARKER.to_string(),
            progress_tx: None,
        }
    }

    /// Set progress channel for updates.
    pub fn with_progress(mut self, tx: mpsc::Sender<ProgressUpdate>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Replace the word that marks statements as fatal on failure.
    pub fn with_fatal_marker(mut self, marker: impl Into<String>) -> Self {
        self.fatal_marker = marker.into();
        self
    }

    pub fn stop_on_error(&self) -> bool {
        self.stop_on_error
    }

    /// Split `script` and run its statements in order.
    pub async fn execute<C>(
        &self,
        conn: &mut C,
        script: &str,
        cancel: &CancellationToken,
    ) -> Result<ExecutionOutcome>
    where
        C: ScriptConnection + ?Sized,
    {
        self.execute_statements(conn, script::split(script), cancel)
            .await
    }

    /// Run already split statements in order.
    pub async fn execute_statements<C>(
        &self,
        conn: &mut C,
        statements: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<ExecutionOutcome>
    where
        C: ScriptConnection + ?Sized,
    {
        let total = statements.len();
        let mut outcome = ExecutionOutcome::new(total);

        info!(
            "Executing {} statement(s) on {} (stop_on_error: {})",
            total,
            conn.vendor(),
            self.stop_on_error
        );

        for (index, sql) in statements.into_iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    "Execution cancelled before statement {} of {}",
                    index + 1,
                    total
                );
                outcome.cancelled = true;
                break;
            }

            match conn.execute_statement(&sql).await {
                Ok(rows_affected) => {
                    debug!(
                        "Statement {} of {} succeeded ({} row(s))",
                        index + 1,
                        total,
                        rows_affected
                    );
                    self.send_progress(ProgressUpdate {
                        index,
                        total,
                        statement: sql.clone(),
                    })
                    .await;
                    outcome.record(index, sql, StatementStatus::Succeeded { rows_affected });
                }
                Err(err) => {
                    if err.is_connection_lost() || self.is_marked_fatal(&sql) {
                        let applied = outcome.succeeded();
                        error!(
                            "Fatal failure at statement {} of {} after {} applied: {}",
                            index + 1,
                            total,
                            applied,
                            err
                        );
                        return Err(MigrateError::Fatal {
                            index,
                            statement: sql,
                            message: err.to_string(),
                            applied,
                        });
                    }

                    warn!("Statement {} of {} failed: {}", index + 1, total, err);
                    outcome.record(
                        index,
                        sql,
                        StatementStatus::Failed {
                            error: err.to_string(),
                        },
                    );

                    if self.stop_on_error {
                        outcome.stopped_on_error = true;
                        break;
                    }
                }
            }
        }

        info!(
            "Execution finished: {} succeeded, {} failed, {} not attempted",
            outcome.succeeded(),
            outcome.failed(),
            outcome.not_attempted()
        );

        Ok(outcome)
    }

    /// Whether a comment before the statement's first code token names the
    /// marker as a whole word (`-- FATAL: ...`, not `-- NONFATAL`).
    pub fn is_marked_fatal(&self, statement: &str) -> bool {
        if self.fatal_marker.is_empty() {
            return false;
        }
        tokenize(statement)
            .iter()
            .take_while(|t| t.is_trivia())
            .filter(|t| t.kind == TokenKind::Comment)
            .any(|t| contains_word(t.text, &self.fatal_marker))
    }

    /// Send progress update if channel is configured.
    async fn send_progress(&self, update: ProgressUpdate) {
        if let Some(tx) = &self.progress_tx {
            let _ = tx.send(update).await;
        }
    }
}

/// Whether `word` occurs in `text` with no identifier character on either side.
fn contains_word(text: &str, word: &str) -> bool {
    let is_ident = |c: char| c.is_alphanumeric() || c == '_';
    text.match_indices(word).any(|(at, _)| {
        let before = text[..at].chars().next_back();
        let after = text[at + word.len()..].chars().next();
        !before.map_or(false, is_ident) && !after.map_or(false, is_ident)
    })
}

/// Run `script` on `conn` with the default fatal marker and no cancellation.
pub async fn execute_script<C>(
    conn: &mut C,
    script: &str,
    stop_on_error: bool,
) -> Result<ExecutionOutcome>
where
    C: ScriptConnection + ?Sized,
{
    ScriptExecutor::new(stop_on_error)
        .execute(conn, script, &CancellationToken::new())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StatementError, Vendor};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// In-memory connection that fails chosen statements.
    #[derive(Default)]
    struct MockConnection {
        executed: Vec<String>,
        failures: HashMap<String, StatementError>,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    impl MockConnection {
        fn failing(mut self, sql: &str, err: StatementError) -> Self {
            self.failures.insert(sql.to_string(), err);
            self
        }
    }

    #[async_trait]
    impl ScriptConnection for MockConnection {
        fn vendor(&self) -> Vendor {
            Vendor::Sqlite
        }

        async fn execute_statement(&mut self, sql: &str) -> std::result::Result<u64, StatementError> {
            self.executed.push(sql.to_string());
            if let Some((after, token)) = &self.cancel_after {
                if self.executed.len() == *after {
                    token.cancel();
                }
            }
            match self.failures.get(sql) {
                Some(err) => Err(err.clone()),
                None => Ok(1),
            }
        }

        async fn ping(&mut self) -> Result<()> {
            Ok(())
        }
    }

    const SCRIPT: &str = "create table a (id integer);\ncreate table b (id integer);\ncreate table c (id integer);";

    #[tokio::test]
    async fn test_continue_on_error_runs_everything() {
        let mut conn = MockConnection::default().failing(
            "create table a (id integer)",
            StatementError::rejected("table a already exists"),
        );
        let outcome = execute_script(&mut conn, SCRIPT, false).await.unwrap();

        assert_eq!(conn.executed.len(), 3);
        assert_eq!(outcome.succeeded(), 2);
        assert_eq!(outcome.failed(), 1);
        assert_eq!(outcome.not_attempted(), 0);
        assert!(!outcome.stopped_on_error);
        let failure = outcome.failures().next().unwrap();
        assert_eq!(failure.index, 0);
        assert_eq!(failure.error(), Some("table a already exists"));
    }

    #[tokio::test]
    async fn test_stop_on_error_skips_the_rest() {
        let mut conn = MockConnection::default().failing(
            "create table b (id integer)",
            StatementError::rejected("syntax error"),
        );
        let outcome = execute_script(&mut conn, SCRIPT, true).await.unwrap();

        assert_eq!(conn.executed.len(), 2);
        assert_eq!(outcome.succeeded(), 1);
        assert_eq!(outcome.failed(), 1);
        assert_eq!(outcome.not_attempted(), 1);
        assert!(outcome.stopped_on_error);
        assert!(matches!(
            outcome.into_result(),
            Err(MigrateError::Execution { index: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_lost_is_fatal_even_when_continuing() {
        let mut conn = MockConnection::default().failing(
            "create table b (id integer)",
            StatementError::connection_lost("broken pipe"),
        );
        let err = execute_script(&mut conn, SCRIPT, false).await.unwrap_err();

        assert_eq!(conn.executed.len(), 2);
        match err {
            MigrateError::Fatal {
                index,
                applied,
                message,
                ..
            } => {
                assert_eq!(index, 1);
                assert_eq!(applied, 1);
                assert!(message.contains("broken pipe"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fatal_marker() {
        let script = "create table a (id integer);\n-- FATAL: schema must exist\ncreate table s.t (id integer);\ncreate table c (id integer);";
        let mut conn = MockConnection::default().failing(
            "-- FATAL: schema must exist\ncreate table s.t (id integer)",
            StatementError::rejected("no such schema"),
        );
        let err = execute_script(&mut conn, script, false).await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(conn.executed.len(), 2);
    }

    #[tokio::test]
    async fn test_marked_statement_that_succeeds_is_harmless() {
        let script = "-- FATAL\ncreate table a (id integer)";
        let mut conn = MockConnection::default();
        let outcome = execute_script(&mut conn, script, true).await.unwrap();
        assert!(outcome.is_success());
    }

    #[test]
    fn test_marker_only_in_leading_comment() {
        let executor = ScriptExecutor::new(true);
        assert!(executor.is_marked_fatal("-- FATAL\nselect 1"));
        assert!(executor.is_marked_fatal("/* FATAL */ select 1"));
        assert!(!executor.is_marked_fatal("select 'FATAL' from t"));
        assert!(!executor.is_marked_fatal("select 1 -- FATAL"));
        assert!(executor.is_marked_fatal("-- FATAL: seed data\nselect 1"));
        assert!(executor.is_marked_fatal("-- must not fail (FATAL)\nselect 1"));
        assert!(!executor.is_marked_fatal("-- NONFATAL\nselect 1"));
        assert!(!executor.is_marked_fatal("-- not fatal-ish: FATALITY\nselect 1"));
        assert!(!executor.is_marked_fatal("-- FATAL_OK\nselect 1"));

        let custom = ScriptExecutor::new(true).with_fatal_marker("CRITICAL");
        assert!(custom.is_marked_fatal("-- CRITICAL\nselect 1"));
        assert!(!custom.is_marked_fatal("-- FATAL\nselect 1"));
    }

    #[tokio::test]
    async fn test_cancellation_between_statements() {
        let cancel = CancellationToken::new();
        let mut conn = MockConnection {
            cancel_after: Some((1, cancel.clone())),
            ..Default::default()
        };
        let outcome = ScriptExecutor::new(false)
            .execute(&mut conn, SCRIPT, &cancel)
            .await
            .unwrap();

        assert_eq!(conn.executed.len(), 1);
        assert!(outcome.cancelled);
        assert_eq!(outcome.not_attempted(), 2);
        assert!(matches!(outcome.into_result(), Err(MigrateError::Cancelled)));
    }

    #[tokio::test]
    async fn test_progress_updates_in_order() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut conn = MockConnection::default();
        ScriptExecutor::new(true)
            .with_progress(tx)
            .execute(&mut conn, SCRIPT, &CancellationToken::new())
            .await
            .unwrap();

        let mut seen = Vec::new();
        while let Ok(update) = rx.try_recv() {
            assert_eq!(update.total, 3);
            seen.push(update.index);
        }
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_progress_skips_failed_statements() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut conn = MockConnection::default().failing(
            "create table b (id integer)",
            StatementError::rejected("table b already exists"),
        );
        let outcome = ScriptExecutor::new(false)
            .with_progress(tx)
            .execute(&mut conn, SCRIPT, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.failed(), 1);

        let mut seen = Vec::new();
        while let Ok(update) = rx.try_recv() {
            seen.push((update.index, update.statement));
        }
        assert_eq!(
            seen,
            vec![
                (0, "create table a (id integer)".to_string()),
                (2, "create table c (id integer)".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_script() {
        let mut conn = MockConnection::default();
        let outcome = execute_script(&mut conn, "  -- nothing\n", true).await.unwrap();
        assert_eq!(outcome.total, 0);
        assert!(outcome.is_success());
    }
}
