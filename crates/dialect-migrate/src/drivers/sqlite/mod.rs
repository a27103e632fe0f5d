//! SQLite driver.
//!
//! Opens the file named by `target.path` (created if missing) or a private
//! in-memory database for `:memory:`.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection as RawSqliteConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::{debug, info};

use crate::config::TargetConfig;
use crate::core::{ScriptConnection, StatementError, Vendor};
use crate::drivers::common::classify_sqlx_error;
use crate::error::{MigrateError, Result};

const MEMORY_PATH: &str = ":memory:";

/// A single SQLite session.
pub struct SqliteConnection {
    conn: RawSqliteConnection,
}

impl SqliteConnection {
    /// Connect using the target configuration.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let path = config
            .path
            .as_deref()
            .ok_or_else(|| MigrateError::Config("target.path is required for sqlite".into()))?;
        let context = format!("opening SQLite target {}", config.describe());

        let options = if path == MEMORY_PATH {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| MigrateError::connection(e, context.clone()))?
        } else {
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
        };

        let conn = tokio::time::timeout(config.connect_timeout(), options.connect())
            .await
            .map_err(|_| MigrateError::connection("timed out", context.clone()))?
            .map_err(|e| MigrateError::connection(e, context))?;

        info!("Connected to SQLite target: {}", path);

        Ok(Self { conn })
    }

    /// Open a private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect(&TargetConfig::sqlite_memory()).await
    }
}

#[async_trait]
impl ScriptConnection for SqliteConnection {
    fn vendor(&self) -> Vendor {
        Vendor::Sqlite
    }

    async fn execute_statement(&mut self, sql: &str) -> std::result::Result<u64, StatementError> {
        debug!("sqlite: {}", sql);
        sqlx::Executor::execute(&mut self.conn, sqlx::raw_sql(sql))
            .await
            .map(|done| done.rows_affected())
            .map_err(classify_sqlx_error)
    }

    async fn ping(&mut self) -> Result<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| MigrateError::connection(e, "pinging SQLite target"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejected_statement_is_not_connection_loss() {
        let mut conn = SqliteConnection::in_memory().await.unwrap();
        conn.execute_statement("create table t (id integer)").await.unwrap();

        let err = conn
            .execute_statement("create table t (id integer)")
            .await
            .unwrap_err();
        assert!(!err.is_connection_lost());
        assert!(err.message.contains("already exists"));
        conn.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_rows_affected() {
        let mut conn = SqliteConnection::in_memory().await.unwrap();
        conn.execute_statement("create table t (id integer)").await.unwrap();
        conn.execute_statement("insert into t values (1), (2)").await.unwrap();
        let rows = conn.execute_statement("update t set id = id + 10").await.unwrap();
        assert_eq!(rows, 2);
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TargetConfig::sqlite_memory();
        config.path = Some(dir.path().join("target.db").to_string_lossy().into_owned());

        let mut conn = SqliteConnection::connect(&config).await.unwrap();
        conn.execute_statement("create table t (id integer)").await.unwrap();
        assert!(dir.path().join("target.db").exists());
    }
}
