//! Migration orchestrator - main workflow coordinator.
//!
//! A run translates the whole script for the configured target before
//! touching the database, so an untranslatable statement never leaves a
//! half-applied script behind. The translated statements then run on a
//! single connection through the [`ScriptExecutor`].

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::core::{ScriptConnection, Vendor};
use crate::dialect::Converter;
use crate::drivers::ConnectionImpl;
use crate::error::{MigrateError, Result};
use crate::executor::{ExecutionOutcome, ProgressUpdate, ScriptExecutor};
use crate::script;

/// Buffered progress updates before the executor waits for the writer.
const PROGRESS_CHANNEL_SIZE: usize = 64;

/// Migration orchestrator.
pub struct Orchestrator {
    config: Config,
    converter: Converter,
    progress: bool,
}

/// A statement the target rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedStatement {
    /// 1-based position in the script.
    pub position: usize,
    pub statement: String,
    pub error: String,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status: completed, failed, cancelled or dry_run.
    pub status: String,

    /// Target vendor.
    pub vendor: Vendor,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// SHA256 of the canonical script, for audit trails.
    pub script_sha256: String,

    /// Statements in the translated script.
    pub statements_total: usize,

    /// Statements applied.
    pub statements_succeeded: usize,

    /// Statements rejected by the target.
    pub statements_failed: usize,

    /// Statements skipped after a stop.
    pub statements_not_attempted: usize,

    /// Rejected statements, in script order.
    pub failures: Vec<FailedStatement>,
}

/// Result of a connection health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub vendor: Vendor,
    /// Target location, without credentials.
    pub target: String,
    pub connected: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
    pub healthy: bool,
}

impl Orchestrator {
    /// Create a new orchestrator.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let converter = Converter::new(config.rule_table());
        Ok(Self {
            config,
            converter,
            progress: false,
        })
    }

    /// Enable JSON-lines progress output on stderr.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Read the script at `path`, falling back to `migration.script`.
    pub fn load_script(&self, path: Option<&Path>) -> Result<String> {
        let path = path
            .or(self.config.migration.script.as_deref())
            .ok_or_else(|| {
                MigrateError::Config(
                    "no script given: pass --script or set migration.script".into(),
                )
            })?;
        info!("Loading script from {:?}", path);
        Ok(std::fs::read_to_string(path)?)
    }

    /// Translate `script` for the configured target.
    pub fn convert(&self, script: &str) -> Result<String> {
        self.converter
            .convert_script(script, self.config.target.r#type)
    }

    /// Translate and apply `script`.
    ///
    /// Translation failures and fatal execution failures are returned as
    /// errors. Rejected statements under continue-on-error are reported in
    /// the result; use [`MigrationResult::error`] to turn them into one.
    pub async fn run(
        &self,
        script: &str,
        cancel: CancellationToken,
        dry_run: bool,
    ) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let vendor = self.config.target.r#type;

        info!("Starting migration run: {} (target: {})", run_id, vendor);

        // Phase 1: translate everything up front
        info!("Phase 1: Translating script to {}", vendor);
        let translated = self.convert(script)?;
        let statements = script::split(&translated);
        info!("Translated {} statement(s)", statements.len());

        let outcome = if dry_run {
            info!("Dry run: not connecting to {}", self.config.target.describe());
            ExecutionOutcome::new(statements.len())
        } else {
            // Phase 2: apply
            info!("Phase 2: Applying script to {}", self.config.target.describe());
            let mut conn = ConnectionImpl::connect(&self.config.target).await?;
            self.execute(&mut conn, statements, &cancel).await?
        };

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let status = if dry_run {
            "dry_run"
        } else if outcome.cancelled {
            "cancelled"
        } else if outcome.failed() > 0 {
            "failed"
        } else {
            "completed"
        };

        let result = MigrationResult {
            run_id,
            status: status.to_string(),
            vendor,
            duration_seconds: duration,
            started_at,
            completed_at,
            script_sha256: script_sha256(script),
            statements_total: outcome.total,
            statements_succeeded: outcome.succeeded(),
            statements_failed: outcome.failed(),
            statements_not_attempted: outcome.not_attempted(),
            failures: outcome
                .failures()
                .map(|f| FailedStatement {
                    position: f.index + 1,
                    statement: f.sql.clone(),
                    error: f.error().unwrap_or_default().to_string(),
                })
                .collect(),
        };

        info!(
            "Migration {}: {}/{} statements applied, {} failed, {} not attempted in {:.1}s",
            result.status,
            result.statements_succeeded,
            result.statements_total,
            result.statements_failed,
            result.statements_not_attempted,
            result.duration_seconds
        );

        Ok(result)
    }

    /// Run translated statements on an open connection.
    pub async fn execute<C>(
        &self,
        conn: &mut C,
        statements: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<ExecutionOutcome>
    where
        C: ScriptConnection + ?Sized,
    {
        let mut executor = ScriptExecutor::new(self.config.migration.stop_on_error)
            .with_fatal_marker(self.config.migration.fatal_marker.clone());

        let writer = if self.progress {
            let (tx, rx) = mpsc::channel(PROGRESS_CHANNEL_SIZE);
            executor = executor.with_progress(tx);
            Some(tokio::spawn(write_progress(rx)))
        } else {
            None
        };

        let outcome = executor.execute_statements(conn, statements, cancel).await;

        // closing the channel lets the writer drain and exit
        drop(executor);
        if let Some(writer) = writer {
            let _ = writer.await;
        }

        outcome
    }

    /// Connect to the target and run a trivial query.
    pub async fn health_check(&self) -> Result<HealthCheckResult> {
        let target = &self.config.target;
        let start = Instant::now();

        let check: Result<()> = async {
            let mut conn = ConnectionImpl::connect(target).await?;
            conn.ping().await
        }
        .await;

        let latency_ms = start.elapsed().as_millis() as u64;
        let error = check.err().map(|e| {
            warn!("Health check failed: {}", e);
            e.to_string()
        });
        let connected = error.is_none();

        Ok(HealthCheckResult {
            vendor: target.r#type,
            target: target.describe(),
            connected,
            latency_ms,
            error,
            healthy: connected,
        })
    }
}

impl MigrationResult {
    /// Serialize the result as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The error a non-successful run maps to, if any.
    pub fn error(&self) -> Option<MigrateError> {
        if self.status == "cancelled" {
            return Some(MigrateError::Cancelled);
        }
        self.failures.first().map(|f| MigrateError::Execution {
            index: f.position - 1,
            statement: f.statement.clone(),
            message: f.error.clone(),
        })
    }
}

/// Hex SHA256 of a script.
pub fn script_sha256(script: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(script.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Write progress updates to stderr as JSON lines until the channel closes.
async fn write_progress(mut rx: mpsc::Receiver<ProgressUpdate>) {
    let mut stderr = tokio::io::stderr();
    while let Some(update) = rx.recv().await {
        let Ok(mut line) = serde_json::to_string(&update) else {
            continue;
        };
        line.push('\n');
        if stderr.write_all(line.as_bytes()).await.is_err() {
            break;
        }
    }
    let _ = stderr.flush().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MigrationConfig, TargetConfig};

    fn sqlite_config(stop_on_error: bool) -> Config {
        Config {
            target: TargetConfig::sqlite_memory(),
            migration: MigrationConfig {
                stop_on_error,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_convert_uses_target_vendor() {
        let mut config = sqlite_config(true);
        config.target.r#type = Vendor::Hsql;
        config.target.host = "localhost".into();
        config.target.database = "db".into();
        config.target.user = "sa".into();
        let orchestrator = Orchestrator::new(config).unwrap();
        assert_eq!(orchestrator.convert("number(19)").unwrap(), "bigint");
    }

    #[test]
    fn test_load_script_requires_a_path() {
        let orchestrator = Orchestrator::new(sqlite_config(true)).unwrap();
        assert!(matches!(
            orchestrator.load_script(None),
            Err(MigrateError::Config(_))
        ));
    }

    #[test]
    fn test_script_sha256() {
        assert_eq!(
            script_sha256(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_dry_run_translates_without_connecting() {
        let mut config = sqlite_config(true);
        config.target.path = Some("/nonexistent/dir/never-created.db".into());
        let orchestrator = Orchestrator::new(config).unwrap();
        let result = orchestrator
            .run(
                "create table t (id number(19));\ncreate table u (id number(3));",
                CancellationToken::new(),
                true,
            )
            .await
            .unwrap();
        assert_eq!(result.status, "dry_run");
        assert_eq!(result.statements_total, 2);
        assert_eq!(result.statements_not_attempted, 2);
        assert!(result.error().is_none());
    }

    #[tokio::test]
    async fn test_translation_failure_stops_before_connecting() {
        let orchestrator = Orchestrator::new(sqlite_config(true)).unwrap();
        let err = orchestrator
            .run("create schema s;", CancellationToken::new(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::Translation { .. }));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_run_on_sqlite() {
        let orchestrator = Orchestrator::new(sqlite_config(false)).unwrap();
        let script = "create table t (id number(19), name varchar2(20 CHAR));\n\
                      create table t (id number(19));\n\
                      insert into t (id, name) values (1, nvl(null, 'x'));";
        let result = orchestrator
            .run(script, CancellationToken::new(), false)
            .await
            .unwrap();

        assert_eq!(result.status, "failed");
        assert_eq!(result.statements_total, 3);
        assert_eq!(result.statements_succeeded, 2);
        assert_eq!(result.statements_failed, 1);
        assert_eq!(result.failures[0].position, 2);
        assert!(matches!(
            result.error(),
            Some(MigrateError::Execution { index: 1, .. })
        ));
        assert!(result.to_json().unwrap().contains("\"vendor\": \"sqlite\""));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_health_check_sqlite_memory() {
        let orchestrator = Orchestrator::new(sqlite_config(true)).unwrap();
        let result = orchestrator.health_check().await.unwrap();
        assert!(result.healthy);
        assert!(result.error.is_none());
    }
}
