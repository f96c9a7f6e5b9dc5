//! Hosts command implementation

use crate::output::format_hosts;
use fr_core::config::FleetConfig;

/// Print the host inventory
pub fn hosts_command(config: &FleetConfig) {
    println!("{}", format_hosts(&config.hosts, config.credentials.default_username.as_deref()));
}
