//! russh client handler: server host key verification

use async_trait::async_trait;
use russh::client;
use russh_keys::key::PublicKey;

use fr_core::config::{HostKeyConfig, HostKeyPolicy};

/// Per-connection handler
pub(crate) struct ClientHandler {
    host: String,
    policy: HostKeyPolicy,
    expected: Option<String>,
}

impl ClientHandler {
    pub(crate) fn new(host: &str, keys: &HostKeyConfig) -> Self {
        Self {
            host: host.to_string(),
            policy: keys.policy,
            expected: keys.fingerprint_for(host).map(normalize_fingerprint),
        }
    }

    fn accepts(&self, fingerprint: &str) -> bool {
        match (self.policy, &self.expected) {
            (_, Some(expected)) => expected == fingerprint,
            (HostKeyPolicy::Accept, None) => true,
            (HostKeyPolicy::Pinned, None) => false,
        }
    }
}

/// Fingerprints are compared without the `SHA256:` prefix
fn normalize_fingerprint(fingerprint: &str) -> String {
    fingerprint
        .trim()
        .strip_prefix("SHA256:")
        .unwrap_or(fingerprint.trim())
        .to_string()
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint();
        let accepted = self.accepts(&fingerprint);

        if accepted {
            tracing::debug!(host = %self.host, fingerprint = %fingerprint, "Server host key accepted");
        } else {
            tracing::warn!(
                host = %self.host,
                fingerprint = %fingerprint,
                expected = ?self.expected,
                "Server host key rejected"
            );
        }

        Ok(accepted)
    }
}
