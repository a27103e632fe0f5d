//! Common utilities shared across database drivers.
//!
//! - [`ssl`]: `ssl_mode` parsing for the network drivers
//! - [`tls`]: rustls connector for PostgreSQL

pub mod ssl;
#[cfg(feature = "postgres")]
pub mod tls;

pub use ssl::SslMode;
#[cfg(feature = "postgres")]
pub use tls::TlsBuilder;

#[cfg(any(feature = "mysql", feature = "sqlite"))]
use crate::core::StatementError;

/// Map an sqlx error onto the executor's failure kinds.
#[cfg(any(feature = "mysql", feature = "sqlite"))]
pub(crate) fn classify_sqlx_error(err: sqlx::Error) -> StatementError {
    match err {
        sqlx::Error::Database(db) => match db.code() {
            Some(code) => StatementError::rejected(format!("{} (code {})", db.message(), code)),
            None => StatementError::rejected(db.message().to_string()),
        },
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StatementError::connection_lost(err.to_string()),
        other => StatementError::rejected(other.to_string()),
    }
}
