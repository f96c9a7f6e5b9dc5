//! Core error types for fleetrun

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Classified failure of a whole session.
///
/// A non-zero exit status is never a `SessionError`; it is recorded as
/// ordinary data in a [`CommandOutcome`](crate::types::CommandOutcome).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SessionError {
    /// Host unreachable or transport negotiation failed
    #[error("network error: {0}")]
    Network(String),

    /// Credentials rejected by the host
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Any other failure before or during connect
    #[error("connection error: {0}")]
    Unclassified(String),

    /// The run was cancelled before the session finished
    #[error("session cancelled")]
    Cancelled,
}

impl SessionError {
    /// Short machine-readable name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Network(_) => "network",
            SessionError::Auth(_) => "auth",
            SessionError::Unclassified(_) => "unclassified",
            SessionError::Cancelled => "cancelled",
        }
    }
}

/// Errors raised by a transport while establishing a connection
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Host unreachable, timed out, or key exchange failed
    #[error("{0}")]
    Network(String),

    /// Credentials were rejected
    #[error("{0}")]
    Auth(String),

    /// Anything else (unreadable key material, unexpected transport state)
    #[error("{0}")]
    Other(String),
}

impl From<ConnectError> for SessionError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::Network(msg) => SessionError::Network(msg),
            ConnectError::Auth(msg) => SessionError::Auth(msg),
            ConnectError::Other(msg) => SessionError::Unclassified(msg),
        }
    }
}

/// Errors raised on an established connection while running a command
#[derive(Error, Debug)]
pub enum ChannelError {
    /// A command channel could not be opened
    #[error("failed to open channel: {0}")]
    Open(String),

    /// The remote end refused to execute the command
    #[error("failed to execute command: {0}")]
    Exec(String),

    /// The connection dropped while the command was running
    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

/// Credential resolution errors
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Neither the host nor the fleet defaults name a user
    #[error("No username configured for host {0}")]
    MissingUsername(String),

    /// No password, host key, or fleet default key is available
    #[error("No credentials available for host {0}")]
    MissingSecret(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Two hosts share the same name
    #[error("Duplicate host name: {0}")]
    DuplicateHost(String),
}
