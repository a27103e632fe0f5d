//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::Vendor;
use crate::dialect::NumberMapping;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target database configuration.
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Target database configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database vendor; decides both the dialect and the driver.
    pub r#type: Vendor,

    /// Database host (network vendors).
    #[serde(default)]
    pub host: String,

    /// Database port (default: the vendor's standard port).
    #[serde(default)]
    pub port: Option<u16>,

    /// Database name.
    #[serde(default)]
    pub database: String,

    /// Username.
    #[serde(default)]
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// SSL mode: disable, prefer, require, verify-ca, verify-full (default: "require").
    #[serde(default = "default_require")]
    pub ssl_mode: String,

    /// Database file for SQLite; `:memory:` for a private in-memory database.
    #[serde(default)]
    pub path: Option<String>,

    /// Seconds to wait for a connection (default: 30).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .field("path", &self.path)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl TargetConfig {
    /// Configured port, or the vendor's default.
    pub fn port(&self) -> Option<u16> {
        self.port.or_else(|| self.r#type.default_port())
    }

    /// Config for an in-memory SQLite database.
    pub fn sqlite_memory() -> Self {
        Self {
            r#type: Vendor::Sqlite,
            host: String::new(),
            port: None,
            database: String::new(),
            user: String::new(),
            password: String::new(),
            ssl_mode: default_require(),
            path: Some(":memory:".to_string()),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Script to run when none is given on the command line.
    #[serde(default)]
    pub script: Option<PathBuf>,

    /// Stop at the first failed statement (default: true).
    #[serde(default = "default_true")]
    pub stop_on_error: bool,

    /// Comment word that makes a statement's failure fatal (default: "FATAL").
    #[serde(default = "default_fatal_marker")]
    pub fatal_marker: String,

    /// `NUMBER(p)` precision thresholds.
    #[serde(default)]
    pub number_mapping: NumberMapping,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            script: None,
            stop_on_error: true,
            fatal_marker: default_fatal_marker(),
            number_mapping: NumberMapping::default(),
        }
    }
}

fn default_require() -> String {
    "require".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_fatal_marker() -> String {
    crate::executor::DEFAULT_FATAL_MARKER.to_string()
}
