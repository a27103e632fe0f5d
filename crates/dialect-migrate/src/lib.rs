//! # dialect-migrate
//!
//! Cross-vendor SQL migration scripts.
//!
//! Migration scripts are written once in a canonical dialect (Oracle) and
//! this library:
//!
//! - **Splits** scripts into statements, respecting literals, comments and
//!   escaped delimiters
//! - **Converts** each statement to the target vendor through an auditable
//!   rule table (HSQLDB, MySQL/MariaDB, PostgreSQL, SQLite)
//! - **Executes** the result statement by statement with stop- or
//!   continue-on-error semantics, treating a lost connection or a
//!   `-- FATAL` statement as unrecoverable
//!
//! ## Example
//!
//! ```rust,no_run
//! use dialect_migrate::{Config, Orchestrator};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> dialect_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config)?;
//!     let script = orchestrator.load_script(None)?;
//!     let result = orchestrator.run(&script, CancellationToken::new(), false).await?;
//!     println!("Applied {} statements", result.statements_succeeded);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod dialect;
pub mod drivers;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod script;

// Re-exports for convenient access
pub use config::{Config, MigrationConfig, TargetConfig};
pub use core::{FailureKind, ScriptConnection, StatementError, Vendor};
pub use dialect::{convert_script, convert_statement, Converter, RuleTable};
pub use drivers::ConnectionImpl;
pub use error::{MigrateError, Result};
pub use executor::{execute_script, ExecutionOutcome, ProgressUpdate, ScriptExecutor};
pub use orchestrator::{HealthCheckResult, MigrationResult, Orchestrator};
