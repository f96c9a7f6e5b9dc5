//! Config command implementations

use std::path::Path;

use anyhow::{Context, Result};

use crate::output::{print_error, print_info, print_success, print_warning};

/// Show the configuration file
pub fn config_show(path: &Path) -> Result<()> {
    if !path.exists() {
        print_warning(&format!("No configuration file found at {}", path.display()));
        print_info("Run 'fleetrun config init' to create one");
        return Ok(());
    }

    print_info(&format!("Configuration file: {}", path.display()));
    println!();

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    println!("{}", content);

    Ok(())
}

/// Write a starter configuration
pub fn config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        print_error(&format!("Config file already exists: {}", path.display()));
        print_info("Use --force to overwrite");
        return Ok(());
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
            print_success(&format!("Created config directory: {}", dir.display()));
        }
    }

    std::fs::write(path, starter_config())
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    print_success(&format!("Created configuration file: {}", path.display()));
    Ok(())
}

/// Starter configuration content
pub fn starter_config() -> &'static str {
    r#"# fleetrun configuration

[execution]
# Hosts contacted at once
max_concurrency = 10
# Seconds allowed for TCP connect and SSH handshake
connect_timeout = 30
# Largest single SSH read, in bytes
max_packet_size = 32768
# Stop a host's command list at its first failing command
stop_on_error = false

[credentials]
# Used for hosts without their own username
# default_username = "deploy"
# Used for hosts without their own password or key
# default_key_path = "~/.ssh/id_ed25519"

[host_keys]
# "accept" logs unknown host keys, "pinned" only allows listed fingerprints
policy = "accept"

[host_keys.fingerprints]
# "web-1" = "SHA256:..."

# [[hosts]]
# name = "web-1"
# address = "10.0.0.5"
# port = 22
# username = "deploy"
# key_path = "~/.ssh/web"
# tags = ["web"]
# env = "production"
"#
}
