//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/treepath/treepath.toml`
//! 3. Local config: `<dir>/.treepath.toml` (working directory unless given)
//! 4. Environment variables: `TREEPATH_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;

/// Unified configuration for treepath.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// SQLite database file (default: ~/.treepath/treepath.db)
    pub database: PathBuf,
    /// Schema the `tree_path` table lives in (default: none, i.e. `main`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_prefix: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: default_database(),
            schema_prefix: None,
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified, inherit").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub database: Option<PathBuf>,
    pub schema_prefix: Option<String>,
}

fn default_database() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".treepath").join("treepath.db"))
        .unwrap_or_else(|| PathBuf::from("~/.treepath/treepath.db"))
}

/// Get the XDG config directory for treepath.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "treepath").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("treepath.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".treepath.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string; unknown variables leave it as is.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            database: overlay
                .database
                .clone()
                .unwrap_or_else(|| self.database.clone()),
            schema_prefix: overlay
                .schema_prefix
                .clone()
                .or_else(|| self.schema_prefix.clone()),
        }
    }

    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.database.to_string_lossy().as_ref());
        self.database = PathBuf::from(expanded);
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Directory holding `.treepath.toml`; the working directory if None
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config: {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        let local_dir = match local_dir {
            Some(dir) => Some(dir.to_path_buf()),
            None => std::env::current_dir().ok(),
        };
        if let Some(dir) = local_dir {
            let local_path = local_config_path(&dir);
            if local_path.exists() {
                debug!("loading local config: {}", local_path.display());
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply TREEPATH_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("TREEPATH").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("database") {
            settings.database = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("schema_prefix") {
            settings.schema_prefix = Some(val).filter(|v| !v.is_empty());
        }

        Ok(settings)
    }

    /// Render as TOML (for `treepath config show`).
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {e}"),
        })
    }
}
