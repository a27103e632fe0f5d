//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::core::Vendor;
use crate::dialect::RuleTable;
use crate::error::Result;
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Built-in rules with the configured `NUMBER` thresholds.
    pub fn rule_table(&self) -> RuleTable {
        RuleTable::builtin().with_number_mapping(self.migration.number_mapping)
    }
}

impl TargetConfig {
    /// Human readable location of the target, without credentials.
    pub fn describe(&self) -> String {
        match self.r#type {
            Vendor::Sqlite => format!("sqlite:{}", self.path.as_deref().unwrap_or_default()),
            vendor => format!(
                "{}://{}:{}/{}",
                vendor,
                self.host,
                self.port().unwrap_or_default(),
                self.database
            ),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
