//! SSH connections and command execution

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect};
use russh_keys::key::KeyPair;
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;

use fr_core::config::{expand_home, ExecutionConfig, HostKeyConfig};
use fr_core::error::{ChannelError, ConnectError};
use fr_core::traits::{Connection, Transport};
use fr_core::{CommandOutcome, Credential, CredentialSecret, Host, KeySource};

use super::handler::ClientHandler;

/// Extended data stream number carrying stderr
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

/// Opens SSH connections with russh
pub struct SshTransport {
    config: Arc<client::Config>,
    connect_timeout: Duration,
    host_keys: HostKeyConfig,
}

impl SshTransport {
    /// Create a transport from the `[execution]` and `[host_keys]` sections
    pub fn new(execution: &ExecutionConfig, host_keys: HostKeyConfig) -> Self {
        let config = client::Config {
            maximum_packet_size: execution.max_packet_size,
            ..Default::default()
        };

        Self {
            config: Arc::new(config),
            connect_timeout: execution.connect_timeout,
            host_keys,
        }
    }

    async fn authenticate(
        &self,
        handle: &mut Handle<ClientHandler>,
        credential: &Credential,
    ) -> Result<bool, ConnectError> {
        let result = match &credential.secret {
            CredentialSecret::Password(password) => {
                handle
                    .authenticate_password(&credential.username, password.expose_secret())
                    .await
            }
            CredentialSecret::PrivateKey(source) => {
                let key = load_key(source)?;
                handle
                    .authenticate_publickey(&credential.username, Arc::new(key))
                    .await
            }
        };

        result.map_err(classify)
    }
}

#[async_trait]
impl Transport for SshTransport {
    type Conn = SshConnection;

    async fn connect(&self, host: &Host, credential: &Credential) -> Result<SshConnection, ConnectError> {
        let handler = ClientHandler::new(&host.name, &self.host_keys);

        let mut handle = tokio::time::timeout(
            self.connect_timeout,
            client::connect(Arc::clone(&self.config), (host.address(), host.port), handler),
        )
        .await
        .map_err(|_| {
            ConnectError::Network(format!(
                "timed out after {:?} connecting to {}",
                self.connect_timeout,
                host.endpoint()
            ))
        })?
        .map_err(classify)?;

        match self.authenticate(&mut handle, credential).await {
            Ok(true) => {}
            Ok(false) => {
                let _ = handle.disconnect(Disconnect::ByApplication, "", "en").await;
                return Err(ConnectError::Auth(format!(
                    "{} authentication rejected for user {}",
                    credential.method(),
                    credential.username
                )));
            }
            Err(e) => {
                let _ = handle.disconnect(Disconnect::ByApplication, "", "en").await;
                return Err(e);
            }
        }

        tracing::debug!(host = %host.name, user = %credential.username, "Authenticated");

        Ok(SshConnection {
            host: host.name.clone(),
            handle,
        })
    }
}

/// An authenticated SSH connection to one host
pub struct SshConnection {
    host: String,
    handle: Handle<ClientHandler>,
}

#[async_trait]
impl Connection for SshConnection {
    async fn execute(&mut self, command: &str) -> Result<CommandOutcome, ChannelError> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| ChannelError::Open(e.to_string()))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| ChannelError::Exec(e.to_string()))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = None;
        let mut eof = false;
        let mut closed = false;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext } if ext == SSH_EXTENDED_DATA_STDERR => {
                    stderr.extend_from_slice(data)
                }
                ChannelMsg::ExitStatus { exit_status } => exit_code = Some(exit_status as i32),
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    tracing::warn!(host = %self.host, signal = ?signal_name, "Command killed by signal");
                }
                ChannelMsg::Eof => eof = true,
                ChannelMsg::Close => {
                    closed = true;
                    break;
                }
                _ => {}
            }
        }

        // The channel went away without finishing the command
        if !closed && !eof && exit_code.is_none() {
            return Err(ChannelError::ConnectionLost(format!(
                "channel to {} closed before the command finished",
                self.host
            )));
        }

        Ok(CommandOutcome {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    async fn close(&mut self) {
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
        {
            tracing::debug!(host = %self.host, error = %e, "Disconnect failed");
        }
    }
}

fn load_key(source: &KeySource) -> Result<KeyPair, ConnectError> {
    let passphrase = source.passphrase().map(|p| p.expose_secret().as_str());

    let loaded = match source {
        KeySource::File { path, .. } => russh_keys::load_secret_key(expand_home(path), passphrase),
        KeySource::Inline { pem, .. } => russh_keys::decode_secret_key(pem.expose_secret(), passphrase),
    };

    loaded.map_err(|e| {
        ConnectError::Other(format!(
            "failed to load private key ({}): {}",
            source.describe(),
            e
        ))
    })
}

/// Sort russh failures into network and everything else
fn classify(err: russh::Error) -> ConnectError {
    let message = err.to_string();
    match err {
        russh::Error::IO(_)
        | russh::Error::ConnectionTimeout
        | russh::Error::Disconnect
        | russh::Error::HUP
        | russh::Error::Kex
        | russh::Error::NoCommonKexAlgo
        | russh::Error::NoCommonKeyAlgo
        | russh::Error::NoCommonCipher
        | russh::Error::UnknownKey
        | russh::Error::WrongServerSig => ConnectError::Network(message),
        _ => ConnectError::Other(message),
    }
}
