//! File-backed defaults.
//!
//! `Settings` is read from a TOML file and supplies the defaults that
//! environment variables may override during config resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub support: SupportSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub backend: String,
    pub pool_size: usize,
    pub libsql_path: Option<PathBuf>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: "postgres".to_string(),
            pool_size: 10,
            libsql_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportSettings {
    pub page_length: i64,
    pub comments_per_page: i64,
    pub recent_limit: i64,
}

impl Default for SupportSettings {
    fn default() -> Self {
        Self {
            page_length: 10,
            comments_per_page: 50,
            recent_limit: 10,
        }
    }
}

impl Settings {
    /// Default settings file location: `SUPPORTDESK_CONFIG`, else
    /// `./supportdesk.toml`.
    pub fn default_path() -> PathBuf {
        std::env::var_os("SUPPORTDESK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("supportdesk.toml"))
    }

    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml(&raw).map_err(|e| {
                ConfigError::ParseError(format!("{}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}
