//! MySQL/MariaDB database driver.
//!
//! This module is only available when the `mysql` feature is enabled:
//!
//! ```toml
//! [dependencies]
//! dialect-migrate = { version = "0.1", features = ["mysql"] }
//! ```
//!
//! # Supported Versions
//!
//! - MySQL 5.7+, 8.0+
//! - MariaDB 10.2+

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::{debug, info, warn};

use crate::config::TargetConfig;
use crate::core::{ScriptConnection, StatementError, Vendor};
use crate::drivers::common::{classify_sqlx_error, SslMode};
use crate::error::{MigrateError, Result};

/// A single MySQL session.
pub struct MysqlConnection {
    conn: MySqlConnection,
}

impl MysqlConnection {
    /// Connect using the target configuration.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let ssl_mode = SslMode::parse(&config.ssl_mode)?;
        if ssl_mode == SslMode::Disable {
            warn!("MySQL TLS is disabled. Credentials will be transmitted in plaintext.");
        }

        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port().unwrap_or(3306))
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(ssl_mode.to_mysql())
            // Use utf8mb4 for full Unicode support
            .charset("utf8mb4");

        let context = format!("connecting to MySQL target {}", config.describe());
        let conn = tokio::time::timeout(config.connect_timeout(), options.connect())
            .await
            .map_err(|_| MigrateError::connection("timed out", context.clone()))?
            .map_err(|e| MigrateError::connection(e, context))?;

        info!("Connected to MySQL target: {}", config.describe());

        Ok(Self { conn })
    }
}

#[async_trait]
impl ScriptConnection for MysqlConnection {
    fn vendor(&self) -> Vendor {
        Vendor::Mysql
    }

    async fn execute_statement(&mut self, sql: &str) -> std::result::Result<u64, StatementError> {
        debug!("mysql: {}", sql);
        sqlx::Executor::execute(&mut self.conn, sqlx::raw_sql(sql))
            .await
            .map(|done| done.rows_affected())
            .map_err(classify_sqlx_error)
    }

    async fn ping(&mut self) -> Result<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| MigrateError::connection(e, "pinging MySQL target"))
    }
}
