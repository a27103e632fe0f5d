//! Database driver implementations.
//!
//! Each driver implements [`ScriptConnection`] over a single session:
//!
//! - [`postgres`]: PostgreSQL via `tokio-postgres` (feature `postgres`)
//! - [`mysql`]: MySQL/MariaDB via `sqlx` (feature `mysql`)
//! - [`sqlite`]: SQLite via `sqlx` (feature `sqlite`)
//! - [`common`]: Shared utilities (SSL modes, TLS, error classification)
//!
//! Oracle and HSQLDB are translation targets only; scripts for them are
//! produced with `convert` and applied by other tooling.
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/` implementing `ScriptConnection`
//! 2. Add an enum variant to [`ConnectionImpl`] and its match arms
//! 3. Register the vendor's rules in `RuleTable::builtin()`
//! 4. Gate the driver with a feature flag in `Cargo.toml`

pub mod common;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use common::SslMode;

#[cfg(feature = "mysql")]
pub use mysql::MysqlConnection;
#[cfg(feature = "postgres")]
pub use postgres::PostgresConnection;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnection;

use async_trait::async_trait;

use crate::config::TargetConfig;
use crate::core::{ScriptConnection, StatementError, Vendor};
use crate::error::{MigrateError, Result};

/// Enum-based static dispatch over the compiled-in drivers.
///
/// The compiler generates a match statement instead of using vtable dispatch.
pub enum ConnectionImpl {
    #[cfg(feature = "postgres")]
    Postgres(PostgresConnection),
    #[cfg(feature = "mysql")]
    Mysql(MysqlConnection),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteConnection),
}

impl ConnectionImpl {
    /// Open a connection to the configured target.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the vendor has no driver (or its
    /// feature is disabled), or a connection error if the session cannot be
    /// established.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        match config.r#type {
            #[cfg(feature = "postgres")]
            Vendor::Postgres => Ok(ConnectionImpl::Postgres(
                PostgresConnection::connect(config).await?,
            )),
            #[cfg(feature = "mysql")]
            Vendor::Mysql => Ok(ConnectionImpl::Mysql(MysqlConnection::connect(config).await?)),
            #[cfg(feature = "sqlite")]
            Vendor::Sqlite => Ok(ConnectionImpl::Sqlite(
                SqliteConnection::connect(config).await?,
            )),
            other => Err(MigrateError::Config(format!(
                "No driver for target type '{}'. Supported types: {}. Use `convert` to produce a script for it instead",
                other,
                supported_vendors().join(", ")
            ))),
        }
    }
}

/// Vendors a connection can be opened to in this build.
pub fn supported_vendors() -> Vec<&'static str> {
    Vendor::ALL
        .iter()
        .filter(|v| v.has_driver())
        .filter(|v| match v {
            Vendor::Postgres => cfg!(feature = "postgres"),
            Vendor::Mysql => cfg!(feature = "mysql"),
            Vendor::Sqlite => cfg!(feature = "sqlite"),
            _ => false,
        })
        .map(|v| v.name())
        .collect()
}

#[async_trait]
impl ScriptConnection for ConnectionImpl {
    fn vendor(&self) -> Vendor {
        match self {
            #[cfg(feature = "postgres")]
            ConnectionImpl::Postgres(c) => c.vendor(),
            #[cfg(feature = "mysql")]
            ConnectionImpl::Mysql(c) => c.vendor(),
            #[cfg(feature = "sqlite")]
            ConnectionImpl::Sqlite(c) => c.vendor(),
        }
    }

    async fn execute_statement(&mut self, sql: &str) -> std::result::Result<u64, StatementError> {
        match self {
            #[cfg(feature = "postgres")]
            ConnectionImpl::Postgres(c) => c.execute_statement(sql).await,
            #[cfg(feature = "mysql")]
            ConnectionImpl::Mysql(c) => c.execute_statement(sql).await,
            #[cfg(feature = "sqlite")]
            ConnectionImpl::Sqlite(c) => c.execute_statement(sql).await,
        }
    }

    async fn ping(&mut self) -> Result<()> {
        match self {
            #[cfg(feature = "postgres")]
            ConnectionImpl::Postgres(c) => c.ping().await,
            #[cfg(feature = "mysql")]
            ConnectionImpl::Mysql(c) => c.ping().await,
            #[cfg(feature = "sqlite")]
            ConnectionImpl::Sqlite(c) => c.ping().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_translation_only_vendors_have_no_driver() {
        for vendor in [Vendor::Oracle, Vendor::Hsql] {
            let mut config = TargetConfig::sqlite_memory();
            config.r#type = vendor;
            assert!(matches!(
                ConnectionImpl::connect(&config).await,
                Err(MigrateError::Config(_))
            ));
        }
    }

    #[test]
    fn test_supported_vendors() {
        let vendors = supported_vendors();
        assert!(!vendors.contains(&"oracle"));
        assert!(!vendors.contains(&"hsql"));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_connection_impl_dispatch() {
        let mut conn = ConnectionImpl::connect(&TargetConfig::sqlite_memory())
            .await
            .unwrap();
        assert_eq!(conn.vendor(), Vendor::Sqlite);
        conn.ping().await.unwrap();
        assert_eq!(conn.execute_statement("create table t (id integer)").await.unwrap(), 0);
    }
}
