//! Credential resolution
//!
//! The engine never reads secrets off a [`Host`] directly. It asks a
//! [`CredentialProvider`] for a resolved [`Credential`] right before it
//! connects. The fallback order is:
//!
//! 1. the host's explicit password
//! 2. the host's explicit private key
//! 3. the fleet-wide default key
//!
//! Resolved secrets stay wrapped in [`SecretString`] and never show up in
//! `Debug` output or logs.

use secrecy::SecretString;
use std::fmt;

use crate::config::CredentialsConfig;
use crate::error::CredentialError;
use crate::types::{Host, KeySource};

/// Secret half of a resolved credential
#[derive(Clone)]
pub enum CredentialSecret {
    /// Password authentication
    Password(SecretString),
    /// Public key authentication
    PrivateKey(KeySource),
}

impl fmt::Debug for CredentialSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSecret::Password(_) => write!(f, "Password([REDACTED])"),
            CredentialSecret::PrivateKey(key) => write!(f, "PrivateKey({})", key.describe()),
        }
    }
}

/// A ready-to-use credential for one host
#[derive(Debug, Clone)]
pub struct Credential {
    /// Login user
    pub username: String,
    /// Password or key
    pub secret: CredentialSecret,
}

impl Credential {
    /// Log-safe name of the authentication method
    pub fn method(&self) -> &'static str {
        match self.secret {
            CredentialSecret::Password(_) => "password",
            CredentialSecret::PrivateKey(_) => "publickey",
        }
    }
}

/// Resolves the credential a host should be contacted with
pub trait CredentialProvider: Send + Sync {
    /// Resolve credentials for `host`
    fn resolve(&self, host: &Host) -> Result<Credential, CredentialError>;
}

/// Credential provider backed by fleet-wide defaults
#[derive(Debug, Clone, Default)]
pub struct FleetCredentials {
    default_username: Option<String>,
    default_key: Option<KeySource>,
}

impl FleetCredentials {
    /// Create a provider with no fleet defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the provider from the `[credentials]` config section
    pub fn from_config(config: &CredentialsConfig) -> Self {
        Self {
            default_username: config.default_username.clone(),
            default_key: config.default_key(),
        }
    }

    /// Set the user for hosts that don't name one
    pub fn with_default_username(mut self, username: impl Into<String>) -> Self {
        self.default_username = Some(username.into());
        self
    }

    /// Set the key for hosts without a password or key of their own
    pub fn with_default_key(mut self, key: KeySource) -> Self {
        self.default_key = Some(key);
        self
    }
}

impl CredentialProvider for FleetCredentials {
    fn resolve(&self, host: &Host) -> Result<Credential, CredentialError> {
        let username = host
            .username
            .clone()
            .or_else(|| self.default_username.clone())
            .ok_or_else(|| CredentialError::MissingUsername(host.name.clone()))?;

        let secret = if let Some(password) = &host.password {
            CredentialSecret::Password(password.clone())
        } else if let Some(key) = host.key() {
            CredentialSecret::PrivateKey(key)
        } else if let Some(key) = &self.default_key {
            CredentialSecret::PrivateKey(key.clone())
        } else {
            return Err(CredentialError::MissingSecret(host.name.clone()));
        };

        tracing::trace!(host = %host.name, user = %username, "Resolved credentials");

        Ok(Credential { username, secret })
    }
}
