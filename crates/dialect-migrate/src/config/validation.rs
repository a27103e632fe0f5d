//! Configuration validation.

use super::Config;
use crate::core::Vendor;
use crate::error::{MigrateError, Result};

const SSL_MODES: &[&str] = &["disable", "prefer", "require", "verify-ca", "verify-full"];

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    let target = &config.target;

    match target.r#type {
        Vendor::Sqlite => {
            if target.path.as_deref().map_or(true, str::is_empty) {
                return Err(MigrateError::Config(
                    "target.path is required for sqlite".into(),
                ));
            }
        }
        _ => {
            if target.host.is_empty() {
                return Err(MigrateError::Config("target.host is required".into()));
            }
            if target.database.is_empty() {
                return Err(MigrateError::Config("target.database is required".into()));
            }
            if target.user.is_empty() {
                return Err(MigrateError::Config("target.user is required".into()));
            }
        }
    }

    if !SSL_MODES.contains(&target.ssl_mode.to_lowercase().as_str()) {
        return Err(MigrateError::Config(format!(
            "target.ssl_mode must be one of {}, got '{}'",
            SSL_MODES.join(", "),
            target.ssl_mode
        )));
    }

    if target.connect_timeout_secs == 0 {
        return Err(MigrateError::Config(
            "target.connect_timeout_secs must be at least 1".into(),
        ));
    }

    if config.migration.fatal_marker.trim().is_empty() {
        return Err(MigrateError::Config(
            "migration.fatal_marker must not be empty".into(),
        ));
    }

    config.migration.number_mapping.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MigrationConfig, TargetConfig};

    fn valid_config() -> Config {
        Config {
            target: TargetConfig {
                r#type: Vendor::Postgres,
                host: "localhost".to_string(),
                port: Some(5432),
                database: "target_db".to_string(),
                user: "postgres".to_string(),
                password: "password".to_string(),
                ssl_mode: "disable".to_string(),
                path: None,
                connect_timeout_secs: 30,
            },
            migration: MigrationConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = valid_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_target_host() {
        let mut config = valid_config();
        config.target.host = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_sqlite_needs_path_not_host() {
        let mut config = valid_config();
        config.target = TargetConfig::sqlite_memory();
        assert!(validate(&config).is_ok());

        config.target.path = None;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_ssl_mode() {
        let mut config = valid_config();
        config.target.ssl_mode = "sometimes".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_inverted_number_mapping() {
        let mut config = valid_config();
        config.migration.number_mapping.integer_max_precision = 20;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_target_config_debug_redacts_password() {
        let mut config = valid_config();
        config.target.password = "super_secret_password_456".to_string();
        let debug_output = format!("{:?}", config.target);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_password_456"),
            "Debug output should not contain actual password value"
        );
    }
}
