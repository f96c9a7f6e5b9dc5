//! fleetrun: command-line interface for fleet command execution
//!
//! Provides the `fleetrun` CLI on top of the `fr-exec` engine.

pub mod commands;
pub mod output;
