//! SSH transport built on russh

mod handler;
mod transport;

pub use transport::{SshConnection, SshTransport};
