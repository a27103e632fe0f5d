//! PostgreSQL driver.
//!
//! One `tokio-postgres` session per script, TLS through rustls.

use std::time::Duration;

use async_trait::async_trait;
use tokio_postgres::{Client, Config as PgConfig, NoTls};
use tracing::{debug, info, warn};

use crate::config::TargetConfig;
use crate::core::{ScriptConnection, StatementError, Vendor};
use crate::drivers::common::{SslMode, TlsBuilder};
use crate::error::{MigrateError, Result};

/// A single PostgreSQL session.
pub struct PostgresConnection {
    client: Client,
}

impl PostgresConnection {
    /// Connect using the target configuration.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.port().unwrap_or(5432));
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);
        pg_config.application_name("dialect-migrate");

        // Connection options for reliability
        pg_config.keepalives(true);
        pg_config.keepalives_idle(Duration::from_secs(30));
        pg_config.connect_timeout(config.connect_timeout());

        let ssl_mode = SslMode::parse(&config.ssl_mode)?;
        let context = format!("connecting to PostgreSQL target {}", config.describe());

        let client = match TlsBuilder::new(ssl_mode).build() {
            None => {
                warn!("PostgreSQL TLS is disabled. Credentials will be transmitted in plaintext.");
                let (client, connection) = pg_config
                    .connect(NoTls)
                    .await
                    .map_err(|e| MigrateError::connection(e, context.clone()))?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        warn!("PostgreSQL connection closed: {}", e);
                    }
                });
                client
            }
            Some(tls) => {
                if ssl_mode == SslMode::Prefer {
                    pg_config.ssl_mode(tokio_postgres::config::SslMode::Prefer);
                } else {
                    pg_config.ssl_mode(tokio_postgres::config::SslMode::Require);
                }
                let (client, connection) = pg_config
                    .connect(tls)
                    .await
                    .map_err(|e| MigrateError::connection(e, context.clone()))?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        warn!("PostgreSQL connection closed: {}", e);
                    }
                });
                client
            }
        };

        info!("Connected to PostgreSQL target: {}", config.describe());

        Ok(Self { client })
    }

    fn classify(&self, err: tokio_postgres::Error) -> StatementError {
        if let Some(db) = err.as_db_error() {
            return StatementError::rejected(format!("{} (SQLSTATE {})", db.message(), db.code().code()));
        }
        if err.is_closed() || self.client.is_closed() {
            return StatementError::connection_lost(err.to_string());
        }
        StatementError::rejected(err.to_string())
    }
}

#[async_trait]
impl ScriptConnection for PostgresConnection {
    fn vendor(&self) -> Vendor {
        Vendor::Postgres
    }

    async fn execute_statement(&mut self, sql: &str) -> std::result::Result<u64, StatementError> {
        debug!("postgres: {}", sql);
        match self.client.execute(sql, &[]).await {
            Ok(rows) => Ok(rows),
            Err(e) => Err(self.classify(e)),
        }
    }

    async fn ping(&mut self) -> Result<()> {
        self.client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| MigrateError::connection(e, "pinging PostgreSQL target"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> TargetConfig {
        let mut config = TargetConfig::sqlite_memory();
        config.r#type = Vendor::Postgres;
        config.path = None;
        config.host = "localhost".into();
        config.database = "postgres".into();
        config.user = "postgres".into();
        config.password = "postgres".into();
        config.ssl_mode = "disable".into();
        config
    }

    #[tokio::test]
    #[ignore] // Requires a running PostgreSQL server
    async fn test_rejected_statement_keeps_session() {
        let mut conn = PostgresConnection::connect(&local_config()).await.unwrap();
        let err = conn.execute_statement("select * from no_such_table").await.unwrap_err();
        assert!(!err.is_connection_lost());
        conn.ping().await.unwrap();
    }
}
