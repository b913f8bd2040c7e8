//! Project configuration loaded from `myapp.toml`.
//!
//! The file is optional. Missing keys fall back to defaults and CLI flags
//! override whatever the file says.

use crate::core::error::MyappError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "myapp.toml";
pub const DEFAULT_DB_FILE: &str = "myapp.sqlite3";
pub const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `myapp=debug`. `MYAPP_LOG` wins over this.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_FILE)
}

fn default_busy_timeout() -> u64 {
    DEFAULT_BUSY_TIMEOUT_SECS
}

/// Load config from an explicit file, or from `myapp.toml` in `dir` when present.
/// A relative database path is resolved against the directory holding the config.
pub fn load_config(dir: &Path, explicit: Option<&Path>) -> Result<AppConfig, MyappError> {
    let config_path = match explicit {
        Some(p) => p.to_path_buf(),
        None => dir.join(CONFIG_FILE_NAME),
    };

    if !config_path.exists() {
        if explicit.is_some() {
            return Err(MyappError::ConfigError(format!(
                "config file not found: {}",
                config_path.display()
            )));
        }
        let mut config = AppConfig::default();
        config.database.path = dir.join(&config.database.path);
        return Ok(config);
    }

    let content = fs::read_to_string(&config_path).map_err(MyappError::IoError)?;
    let mut config: AppConfig = toml::from_str(&content)
        .map_err(|e| MyappError::ConfigError(format!("{}: {}", config_path.display(), e)))?;

    if config.database.path.is_relative() {
        let base = config_path.parent().unwrap_or(dir);
        config.database.path = base.join(&config.database.path);
    }
    Ok(config)
}
