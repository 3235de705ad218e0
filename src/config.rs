use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

pub const DEFAULT_SEPARATOR: &str = "_";

/// Where the backing store keeps its data.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum StoreLocation
{
    /// Fastest, nothing persisted.
    InMemory,
    /// On disk for the lifetime of the store only.
    TempFile,
    /// Durable across restarts.
    Path(PathBuf),
}

impl Default for StoreLocation
{
    // Matches the original behaviour of a vault opened without a location.
    fn default() -> Self
    {
        StoreLocation::TempFile
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig
{
    #[serde(default)]
    pub location: StoreLocation,
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String
{
    DEFAULT_SEPARATOR.to_string()
}

impl Default for StoreConfig
{
    fn default() -> Self
    {
        StoreConfig {
            location: StoreLocation::default(),
            separator: default_separator(),
        }
    }
}

impl StoreConfig
{
    pub fn in_memory() -> Self
    {
        StoreConfig { location: StoreLocation::InMemory, ..Default::default() }
    }

    pub fn temp_file() -> Self
    {
        StoreConfig { location: StoreLocation::TempFile, ..Default::default() }
    }

    pub fn path(p: impl Into<PathBuf>) -> Self
    {
        StoreConfig {
            location: StoreLocation::Path(p.into()),
            ..Default::default()
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self
    {
        self.separator = separator.into();
        self
    }

    pub fn validate(&self) -> Result<()>
    {
        if self.separator.is_empty() {
            return Err(VaultError::Config(
                    "separator must not be empty".to_string()));
        }
        if let StoreLocation::Path(p) = &self.location {
            if p.as_os_str().is_empty() {
                return Err(VaultError::Config(
                        "store path must not be empty".to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultConfig
{
    #[serde(default)]
    pub store: StoreConfig,
}

pub fn get_config_str(configfile: &Path) -> Result<String>
{
    match std::fs::read_to_string(configfile) {
        Ok(config_str) => Ok(config_str),
        Err(e) => Err(VaultError::Config(
                std::format!("failed to read config file {}, err: {}",
                             configfile.display(), e))),
    }
}

pub fn parse_config(config_str: &str) -> Result<VaultConfig>
{
    let config: VaultConfig = serde_json::from_str(config_str)
        .map_err(|e| VaultError::Config(
                std::format!("parsing json config failed, err: {}", e)))?;
    config.store.validate()?;
    Ok(config)
}

pub fn read_and_parse_config(configfile: &Path) -> Result<VaultConfig>
{
    let config_str = get_config_str(configfile)?;
    parse_config(&config_str)
}
