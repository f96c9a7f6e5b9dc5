//! Fleet configuration

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use super::expand_home;
use super::serde_utils::duration_secs;
use crate::error::ConfigError;
use crate::types::{Host, KeySource};

/// Default number of hosts contacted at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Default maximum SSH packet size, bounds a single read from a channel
pub const DEFAULT_MAX_PACKET_SIZE: u32 = 32 * 1024;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Execution tuning
    pub execution: ExecutionConfig,

    /// Fleet-wide credential defaults
    pub credentials: CredentialsConfig,

    /// Host key verification
    pub host_keys: HostKeyConfig,

    /// Host inventory
    pub hosts: Vec<Host>,
}

impl FleetConfig {
    /// Check cross-field invariants the deserializer can't express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "execution.max_concurrency must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for host in &self.hosts {
            if host.name.trim().is_empty() {
                return Err(ConfigError::Invalid("host name must not be empty".to_string()));
            }
            if !seen.insert(host.name.as_str()) {
                return Err(ConfigError::DuplicateHost(host.name.clone()));
            }
        }

        Ok(())
    }

    /// Look up a host by name
    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.name == name)
    }

    /// Pick hosts by exact name; an empty selection means every host
    pub fn select_hosts(&self, names: &[String]) -> Result<Vec<Host>, ConfigError> {
        if names.is_empty() {
            return Ok(self.hosts.clone());
        }

        names
            .iter()
            .map(|name| {
                self.host(name)
                    .cloned()
                    .ok_or_else(|| ConfigError::Invalid(format!("unknown host: {}", name)))
            })
            .collect()
    }
}

/// Execution tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Maximum number of hosts contacted concurrently
    pub max_concurrency: usize,

    /// Timeout for establishing a connection (TCP + handshake)
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Maximum SSH packet size in bytes, i.e. the largest single read
    pub max_packet_size: u32,

    /// Stop a host's command list at the first failing command
    pub stop_on_error: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            connect_timeout: Duration::from_secs(30),
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            stop_on_error: false,
        }
    }
}

/// Fleet-wide credential defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// User for hosts that don't name one
    pub default_username: Option<String>,

    /// Fleet default private key
    pub default_key_path: Option<PathBuf>,

    /// Passphrase for the fleet default key
    pub default_key_passphrase: Option<SecretString>,
}

impl CredentialsConfig {
    /// The fleet default key, with `~` expanded
    pub fn default_key(&self) -> Option<KeySource> {
        self.default_key_path.as_ref().map(|path| KeySource::File {
            path: expand_home(path),
            passphrase: self.default_key_passphrase.clone(),
        })
    }
}

/// How server host keys are verified
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKeyPolicy {
    /// Accept any host key, logging its fingerprint
    #[default]
    Accept,
    /// Only accept hosts whose fingerprint is listed
    Pinned,
}

/// Host key verification settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostKeyConfig {
    /// Verification policy
    pub policy: HostKeyPolicy,

    /// Expected SHA256 fingerprints, keyed by host name
    pub fingerprints: HashMap<String, String>,
}

impl HostKeyConfig {
    /// Expected fingerprint for a host
    pub fn fingerprint_for(&self, host: &str) -> Option<&str> {
        self.fingerprints.get(host).map(String::as_str)
    }
}
