//! fr-core: Core abstractions and configuration for fleetrun
//!
//! This crate provides the shared host model, credential resolution,
//! configuration structures and the transport traits used by the
//! execution engine and the CLI.

pub mod config;
pub mod credentials;
pub mod error;
pub mod traits;
pub mod types;

pub use credentials::{Credential, CredentialProvider, CredentialSecret, FleetCredentials};
pub use error::{ConfigError, CredentialError, SessionError};
pub use types::{CommandOutcome, Host, KeySource};
