//! CLI command implementations

mod config;
mod ensure_dir;
mod hosts;
mod run;

pub use config::{config_init, config_show, starter_config};
pub use ensure_dir::{ensure_dir_command, EnsureDirOptions};
pub use hosts::hosts_command;
pub use run::{run_command, RunOptions};

use tokio_util::sync::CancellationToken;

use fr_core::config::FleetConfig;
use fr_core::FleetCredentials;
use fr_exec::{ExecutionPool, SshTransport};

/// Build an SSH execution pool from the loaded configuration
fn ssh_pool(
    config: &FleetConfig,
    concurrency: Option<usize>,
    cancel: CancellationToken,
) -> ExecutionPool<SshTransport> {
    let transport = SshTransport::new(&config.execution, config.host_keys.clone());
    let credentials = FleetCredentials::from_config(&config.credentials);

    let pool = ExecutionPool::new(transport, credentials)
        .with_config(&config.execution)
        .with_cancellation(cancel);

    match concurrency {
        Some(n) => pool.with_max_concurrency(n),
        None => pool,
    }
}
