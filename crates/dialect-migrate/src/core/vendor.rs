//! Database vendors a migration script can be translated to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// SQL dialect of a database engine.
///
/// Scripts are authored in the canonical dialect ([`Vendor::Oracle`]);
/// every other variant is a translation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// Canonical source dialect. Converting to it is the identity transform.
    #[serde(alias = "ora")]
    Oracle,
    /// HSQLDB: explicit 64-bit `BIGINT`, keeps Oracle's parenthesized ALTER lists.
    #[serde(alias = "hsqldb")]
    Hsql,
    /// MySQL / MariaDB: generic `INTEGER`, unparenthesized `MODIFY`.
    #[serde(alias = "mariadb")]
    Mysql,
    /// PostgreSQL.
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
    /// SQLite (file or in-memory).
    #[serde(alias = "sqlite3")]
    Sqlite,
}

impl Vendor {
    /// The dialect migration scripts are written in.
    pub const CANONICAL: Vendor = Vendor::Oracle;

    /// Every known vendor, canonical first.
    pub const ALL: [Vendor; 5] = [
        Vendor::Oracle,
        Vendor::Hsql,
        Vendor::Mysql,
        Vendor::Postgres,
        Vendor::Sqlite,
    ];

    /// Lowercase identifier used in config files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Vendor::Oracle => "oracle",
            Vendor::Hsql => "hsql",
            Vendor::Mysql => "mysql",
            Vendor::Postgres => "postgres",
            Vendor::Sqlite => "sqlite",
        }
    }

    pub fn is_canonical(&self) -> bool {
        *self == Self::CANONICAL
    }

    /// Whether this crate ships a driver able to execute scripts on the vendor.
    pub fn has_driver(&self) -> bool {
        matches!(self, Vendor::Mysql | Vendor::Postgres | Vendor::Sqlite)
    }

    /// Default TCP port for network databases.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Vendor::Oracle => Some(1521),
            Vendor::Hsql => Some(9001),
            Vendor::Mysql => Some(3306),
            Vendor::Postgres => Some(5432),
            Vendor::Sqlite => None,
        }
    }

    /// Parse a vendor from a name or one of its aliases, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns a config error if the name is not recognized.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "oracle" | "ora" => Ok(Vendor::Oracle),
            "hsql" | "hsqldb" => Ok(Vendor::Hsql),
            "mysql" | "mariadb" => Ok(Vendor::Mysql),
            "postgres" | "postgresql" | "pg" => Ok(Vendor::Postgres),
            "sqlite" | "sqlite3" => Ok(Vendor::Sqlite),
            other => Err(MigrateError::Config(format!(
                "Unknown database vendor: '{}'. Supported vendors: oracle, hsql, mysql, postgres, sqlite",
                other
            ))),
        }
    }
}

impl FromStr for Vendor {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self> {
        Vendor::parse(s)
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
