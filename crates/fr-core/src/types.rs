//! Core domain types

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

/// A remote machine and the credentials it should be reached with.
///
/// Hosts are owned by the inventory and only ever read by the engine.
/// The `name` is the host's identity inside a fleet run; `address`
/// defaults to the name when omitted.
#[derive(Clone, Deserialize)]
pub struct Host {
    /// Unique name within the inventory
    pub name: String,

    /// Network address (hostname or IP), defaults to `name`
    #[serde(default)]
    pub address: Option<String>,

    /// SSH port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Login user, falls back to the fleet default user
    #[serde(default)]
    pub username: Option<String>,

    /// Explicit password
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Path to a private key file
    #[serde(default)]
    pub key_path: Option<PathBuf>,

    /// Inline private key material (PEM / OpenSSH format)
    #[serde(default)]
    pub private_key: Option<SecretString>,

    /// Passphrase for the host key
    #[serde(default)]
    pub key_passphrase: Option<SecretString>,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Environment label (e.g. "production")
    #[serde(default)]
    pub env: Option<String>,
}

impl Host {
    /// Create a host reachable at its own name on the default port
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            port: DEFAULT_SSH_PORT,
            username: None,
            password: None,
            key_path: None,
            private_key: None,
            key_passphrase: None,
            tags: vec![],
            env: None,
        }
    }

    /// Set the network address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the SSH port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the login user
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set an explicit password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::new(password.into()));
        self
    }

    /// Set a private key file
    pub fn with_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the environment label
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    /// Address to connect to
    pub fn address(&self) -> &str {
        self.address.as_deref().unwrap_or(&self.name)
    }

    /// `address:port` for display and logging
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address(), self.port)
    }

    /// Key configured directly on this host, inline material first
    pub fn key(&self) -> Option<KeySource> {
        if let Some(pem) = &self.private_key {
            return Some(KeySource::Inline {
                pem: pem.clone(),
                passphrase: self.key_passphrase.clone(),
            });
        }
        self.key_path.as_ref().map(|path| KeySource::File {
            path: path.clone(),
            passphrase: self.key_passphrase.clone(),
        })
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("name", &self.name)
            .field("address", &self.address())
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("key", &self.key().map(|k| k.describe()))
            .field("tags", &self.tags)
            .field("env", &self.env)
            .finish()
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Where private key material comes from
#[derive(Clone)]
pub enum KeySource {
    /// Key stored in a file
    File {
        path: PathBuf,
        passphrase: Option<SecretString>,
    },
    /// Key material held in memory
    Inline {
        pem: SecretString,
        passphrase: Option<SecretString>,
    },
}

impl KeySource {
    /// Key file without a passphrase
    pub fn file(path: impl Into<PathBuf>) -> Self {
        KeySource::File {
            path: path.into(),
            passphrase: None,
        }
    }

    /// Passphrase protecting the key, if any
    pub fn passphrase(&self) -> Option<&SecretString> {
        match self {
            KeySource::File { passphrase, .. } | KeySource::Inline { passphrase, .. } => {
                passphrase.as_ref()
            }
        }
    }

    /// Log-safe description (never includes key material)
    pub fn describe(&self) -> String {
        match self {
            KeySource::File { path, .. } => format!("file:{}", path.display()),
            KeySource::Inline { .. } => "inline".to_string(),
        }
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeySource({})", self.describe())
    }
}

/// Result of one command executed on one host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    /// Exit status; `None` when the channel closed without reporting one
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutcome {
    /// Create an outcome with an exit status
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with status zero
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
