//! Configuration.
//!
//! Resolution order: built-in defaults, then the TOML settings file, then
//! environment variables (after loading `.env`).

mod database;
pub(crate) mod helpers;
mod support;

use crate::error::ConfigError;
use crate::settings::Settings;

pub use database::{DatabaseBackend, DatabaseConfig, default_libsql_path};
pub use support::SupportConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub support: SupportConfig,
}

impl Config {
    /// Load `.env`, read the settings file and resolve the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let path = Settings::default_path();
        tracing::debug!("Loading settings from {}", path.display());
        let settings = Settings::load_from(&path)?;
        Self::resolve(&settings)
    }

    pub fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            database: DatabaseConfig::resolve(settings)?,
            support: SupportConfig::resolve(settings)?,
        })
    }
}
