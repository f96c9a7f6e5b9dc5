//! Configuration management for fleetrun

mod fleet;
pub mod serde_utils;

pub use fleet::{
    CredentialsConfig, ExecutionConfig, FleetConfig, HostKeyConfig, HostKeyPolicy,
    DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_PACKET_SIZE,
};

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fleetrun")
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Load and validate a fleet configuration
pub fn load_fleet_config(path: &Path) -> Result<FleetConfig, ConfigError> {
    let config: FleetConfig = load_config(path)?;
    config.validate()?;
    tracing::debug!(path = %path.display(), hosts = config.hosts.len(), "Loaded fleet config");
    Ok(config)
}

/// Expand a leading `~/` to the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
