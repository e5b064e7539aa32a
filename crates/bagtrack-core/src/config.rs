use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persistence::SOFT_BUDGET_BYTES;
use crate::store::DEFAULT_QUOTA_BYTES;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BagtrackConfig {
    pub version: u32,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageConfig {
    pub dir: Option<PathBuf>,
    pub quota_bytes: Option<usize>,
    pub soft_budget_bytes: Option<usize>,
}

impl Default for BagtrackConfig {
    fn default() -> Self {
        Self {
            version: 1,
            storage: StorageConfig::default(),
        }
    }
}

impl BagtrackConfig {
    pub fn quota_bytes(&self) -> usize {
        self.storage.quota_bytes.unwrap_or(DEFAULT_QUOTA_BYTES)
    }

    pub fn soft_budget_bytes(&self) -> usize {
        self.storage.soft_budget_bytes.unwrap_or(SOFT_BUDGET_BYTES)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not resolve home directory for config path")]
    HomeDirectoryUnavailable,
    #[error("could not resolve a data directory for the store")]
    DataDirectoryUnavailable,
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {message}")]
    Validation { message: String },
}

pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(base_dirs
        .home_dir()
        .join(".config")
        .join("bagtrack")
        .join("config.toml"))
}

/// Directory backing the file store: the configured one, or the platform
/// data directory.
pub fn resolve_store_dir(config: &BagtrackConfig) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = &config.storage.dir {
        return Ok(dir.clone());
    }

    ProjectDirs::from("dev", "bagtrack", "bagtrack")
        .map(|dirs| dirs.data_dir().join("store"))
        .ok_or(ConfigError::DataDirectoryUnavailable)
}

pub fn load_config(path: &Path) -> Result<BagtrackConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed: BagtrackConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&parsed)?;
    Ok(parsed)
}

/// A missing config file means defaults; a present but broken one is an
/// error.
pub fn load_config_or_default(path: &Path) -> Result<BagtrackConfig, ConfigError> {
    if !path.exists() {
        return Ok(BagtrackConfig::default());
    }

    load_config(path)
}

pub fn validate_config(config: &BagtrackConfig) -> Result<(), ConfigError> {
    if config.version != 1 {
        return Err(ConfigError::Validation {
            message: "version must be 1".to_string(),
        });
    }

    if config
        .storage
        .dir
        .as_ref()
        .is_some_and(|dir| dir.as_os_str().is_empty())
    {
        return Err(ConfigError::Validation {
            message: "storage.dir must be non-empty".to_string(),
        });
    }

    let quota = config.quota_bytes();
    let budget = config.soft_budget_bytes();
    if budget == 0 {
        return Err(ConfigError::Validation {
            message: "storage.soft_budget_bytes must be greater than zero".to_string(),
        });
    }

    if budget > quota {
        return Err(ConfigError::Validation {
            message: format!(
                "storage.soft_budget_bytes ({budget}) must not exceed storage.quota_bytes ({quota})"
            ),
        });
    }

    Ok(())
}
