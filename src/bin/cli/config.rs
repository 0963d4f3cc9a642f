use super::{ThemeArg, VerifyLevelArg};
use clap::ValueEnum;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings read from `cli.toml`.
#[derive(Debug, Default)]
pub struct CliConfig {
    path: Option<PathBuf>,
    data: RawConfig,
}

impl CliConfig {
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let explicit_given = explicit.is_some();
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            Some(config_path) if explicit_given => {
                return Err(ConfigError::Missing {
                    path: config_path.clone(),
                })
            }
            _ => RawConfig::default(),
        };
        let config = Self { path, data };
        // surface bad enum values at startup rather than mid-command
        config.verify_level()?;
        config.theme()?;
        Ok(config)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn default_store_path(&self) -> Option<&PathBuf> {
        self.data.store.default_path.as_ref()
    }

    pub fn fsync(&self) -> Option<bool> {
        self.data.store.fsync
    }

    pub fn verify_level(&self) -> Result<Option<VerifyLevelArg>, ConfigError> {
        self.data
            .store
            .verify_level
            .as_deref()
            .map(|value| {
                VerifyLevelArg::from_str(value, true).map_err(|_| ConfigError::InvalidValue {
                    key: "store.verify_level",
                    value: value.to_string(),
                })
            })
            .transpose()
    }

    pub fn theme(&self) -> Result<Option<ThemeArg>, ConfigError> {
        self.data
            .ui
            .theme
            .as_deref()
            .map(|value| {
                ThemeArg::from_str(value, true).map_err(|_| ConfigError::InvalidValue {
                    key: "ui.theme",
                    value: value.to_string(),
                })
            })
            .transpose()
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    store: StoreSection,
    #[serde(default)]
    ui: UiSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoreSection {
    #[serde(rename = "default")]
    default_path: Option<PathBuf>,
    fsync: Option<bool>,
    verify_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct UiSection {
    theme: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read CLI config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse CLI config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("CLI config {path} does not exist")]
    Missing { path: PathBuf },
    #[error("CLI config key '{key}' has invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("flatadj").join("cli.toml"))
}
