//! Transport traits
//!
//! The execution engine only needs two capabilities from a remote shell
//! transport: open an authenticated connection to a host, and run one
//! command at a time on it. Everything protocol-level (handshake,
//! encryption, authentication wire format) lives behind these traits.

use async_trait::async_trait;

use crate::credentials::Credential;
use crate::error::{ChannelError, ConnectError};
use crate::types::{CommandOutcome, Host};

/// Opens authenticated connections to hosts
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport
    type Conn: Connection;

    /// Connect and authenticate.
    ///
    /// Failures must be classified: unreachable hosts and negotiation
    /// failures as [`ConnectError::Network`], rejected credentials as
    /// [`ConnectError::Auth`], anything else as [`ConnectError::Other`].
    async fn connect(&self, host: &Host, credential: &Credential)
        -> Result<Self::Conn, ConnectError>;
}

/// An authenticated connection to one host
#[async_trait]
pub trait Connection: Send + 'static {
    /// Run a command on a fresh channel and wait for it to finish,
    /// collecting both output streams and the exit status.
    async fn execute(&mut self, command: &str) -> Result<CommandOutcome, ChannelError>;

    /// Close the connection. Called exactly once per connection.
    async fn close(&mut self);
}
