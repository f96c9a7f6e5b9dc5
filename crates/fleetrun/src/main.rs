//! fleetrun CLI
//!
//! Runs shell commands on every host of an inventory over SSH, a bounded
//! number of hosts at a time, and reports per-host results.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleetrun::commands::{self, EnsureDirOptions, RunOptions};
use fleetrun::output::print_warning;
use fr_core::config::{self, FleetConfig};
use fr_exec::DisplayOptions;

#[derive(Parser)]
#[command(name = "fleetrun")]
#[command(author, version, about = "Run shell commands across a fleet of hosts over SSH")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "FLEETRUN_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Selection {
    /// Only run on these hosts (repeatable, default: every host)
    #[arg(long = "host", value_name = "NAME")]
    hosts: Vec<String>,

    /// Maximum number of hosts contacted at once (overrides config)
    #[arg(short = 'j', long, value_name = "N")]
    concurrency: Option<usize>,

    /// Print the fleet result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run commands on the fleet
    Run {
        /// Commands to run, in order, on every host
        #[arg(required = true, value_name = "COMMAND")]
        commands: Vec<String>,

        #[command(flatten)]
        selection: Selection,

        /// Stop a host's command list at its first failing command
        #[arg(long, overrides_with = "no_stop_on_error")]
        stop_on_error: bool,

        /// Run every command even if `stop_on_error` is set in the config
        #[arg(long, overrides_with = "stop_on_error")]
        no_stop_on_error: bool,

        /// Show standard output lines
        #[arg(long)]
        stdout: bool,

        /// Show standard error lines
        #[arg(long)]
        stderr: bool,

        /// Don't print the per-host status lines
        #[arg(long)]
        no_summary: bool,
    },

    /// Make sure a directory exists on the fleet
    EnsureDir {
        /// Directory path
        path: String,

        #[command(flatten)]
        selection: Selection,
    },

    /// List the host inventory
    Hosts,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show config file path
    Path,
    /// Show current configuration
    Show,
    /// Write a starter configuration
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config_path = cli.config.unwrap_or_else(config::default_config_path);

    let success = match cli.command {
        Commands::Run {
            commands: to_run,
            selection,
            stop_on_error,
            no_stop_on_error,
            stdout,
            stderr,
            no_summary,
        } => {
            let fleet = load(&config_path)?;
            let options = RunOptions {
                commands: to_run,
                hosts: selection.hosts,
                concurrency: selection.concurrency,
                stop_on_error: match (stop_on_error, no_stop_on_error) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                display: DisplayOptions {
                    show_stdout: stdout,
                    show_stderr: stderr,
                    show_summary: !no_summary,
                },
                json: selection.json,
            };
            commands::run_command(&fleet, options, shutdown_token()).await?
        }

        Commands::EnsureDir { path, selection } => {
            let fleet = load(&config_path)?;
            let options = EnsureDirOptions {
                path,
                hosts: selection.hosts,
                concurrency: selection.concurrency,
                json: selection.json,
            };
            commands::ensure_dir_command(&fleet, options, shutdown_token()).await?
        }

        Commands::Hosts => {
            let fleet = load(&config_path)?;
            commands::hosts_command(&fleet);
            true
        }

        Commands::Config { action } => {
            match action {
                ConfigAction::Path => println!("{}", config_path.display()),
                ConfigAction::Show => commands::config_show(&config_path)?,
                ConfigAction::Init { force } => commands::config_init(&config_path, force)?,
            }
            true
        }
    };

    if !success {
        std::process::exit(1);
    }

    Ok(())
}

fn load(path: &Path) -> Result<FleetConfig> {
    config::load_fleet_config(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Token cancelled on Ctrl+C
fn shutdown_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            print_warning("Interrupted, cancelling remaining hosts...");
            tracing::info!("Received Ctrl+C, cancelling fleet run");
            trigger.cancel();
        }
    });

    cancel
}
