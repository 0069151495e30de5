//! Configuration management for the tally node.
//!
//! Provides layered configuration loading with priority:
//! 1. Default values (hardcoded)
//! 2. Optional config file (`config/tally.toml` or an explicit path)
//! 3. `TALLY_CONFIG` file override
//! 4. Environment variables (highest priority, `TALLY__` prefix)

mod ballot;
mod cache;
mod monitoring;
mod retry;
mod storage;
pub use ballot::*;
pub use cache::*;
pub use monitoring::*;
pub use retry::*;
pub use storage::*;


//---
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Ticket rotation, quota and increment-strategy parameters
    #[serde(default)]
    pub ballot: BallotConfig,
    /// Read-cache and singleflight parameters
    #[serde(default)]
    pub cache: CacheConfig,
    /// Durable-store and fast-store connection parameters
    #[serde(default)]
    pub storage: StorageConfig,
    /// Retry policies for contended operations
    #[serde(default)]
    pub retry: RetryPolicies,
    /// Metrics endpoint settings
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

impl Settings {
    /// Load configuration with proper priority ordering.
    ///
    /// # Arguments
    /// * `path` - Optional explicit config file path; when absent the
    ///   default `config/tally` file is merged if present
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        // 1. Config file
        match path {
            Some(custom) => {
                builder = builder.add_source(File::with_name(custom).required(true));
            }
            None => {
                builder = builder.add_source(File::with_name("config/tally").required(false));
            }
        }

        // 2. File override via environment
        if let Ok(env_path) = env::var("TALLY_CONFIG") {
            builder = builder.add_source(File::with_name(&env_path));
        }

        // 3. Environment variables (highest priority)
        builder = builder.add_source(
            Environment::with_prefix("TALLY")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.ballot.validate()?;
        self.monitoring.validate()?;
        Ok(())
    }
}
