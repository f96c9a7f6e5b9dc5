//! Run command implementation

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::output::{print_fleet_summary, print_warning};
use fr_core::config::FleetConfig;
use fr_exec::{DisplayOptions, FleetResult};

/// Options for `fleetrun run`
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Commands to run on every host
    pub commands: Vec<String>,
    /// Host names to target, empty for the whole inventory
    pub hosts: Vec<String>,
    /// Concurrency override
    pub concurrency: Option<usize>,
    /// Stop a host at its first failing command, `None` defers to the config
    pub stop_on_error: Option<bool>,
    /// What to print
    pub display: DisplayOptions,
    /// Print JSON instead of text
    pub json: bool,
}

/// Run commands on the selected hosts; returns whether every host succeeded
pub async fn run_command(
    config: &FleetConfig,
    options: RunOptions,
    cancel: CancellationToken,
) -> Result<bool> {
    let hosts = config.select_hosts(&options.hosts)?;
    if hosts.is_empty() {
        print_warning("No hosts in inventory, nothing to do");
        return Ok(true);
    }

    let stop_on_error = effective_stop_on_error(&options, config);
    let pool = super::ssh_pool(config, options.concurrency, cancel);

    tracing::info!(
        hosts = hosts.len(),
        commands = options.commands.len(),
        stop_on_error,
        "Running commands"
    );

    let result = pool
        .run_commands(hosts, &options.commands, stop_on_error)
        .await;

    report(&result, &options.display, options.json)?;

    Ok(result.success())
}

/// Command-line choice first, then the `[execution]` setting
fn effective_stop_on_error(options: &RunOptions, config: &FleetConfig) -> bool {
    options
        .stop_on_error
        .unwrap_or(config.execution.stop_on_error)
}

/// Print a fleet result as text or JSON
pub(crate) fn report(result: &FleetResult, display: &DisplayOptions, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    print!("{}", result.display(display));
    if display.show_summary {
        print_fleet_summary(&result.summary());
    }

    Ok(())
}
