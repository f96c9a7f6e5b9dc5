//! Ensure-directory command implementation

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::output::{print_fleet_summary, print_warning};
use fr_core::config::FleetConfig;
use fr_exec::{EnsureDirectory, FleetResult, FleetSummary, SessionResult};

/// Options for `fleetrun ensure-dir`
#[derive(Debug, Clone)]
pub struct EnsureDirOptions {
    /// Directory that must exist
    pub path: String,
    /// Host names to target, empty for the whole inventory
    pub hosts: Vec<String>,
    /// Concurrency override
    pub concurrency: Option<usize>,
    /// Print JSON instead of text
    pub json: bool,
}

/// Per-host state of the directory after the policy ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DirState {
    Present,
    Created,
    Failed,
}

/// Interpret one host's policy run.
///
/// The stat that found the directory missing exits non-zero, so the
/// session itself never counts as a success when a mkdir was needed.
/// What matters is the last command.
pub(crate) fn dir_state(result: &SessionResult) -> DirState {
    let outcomes = result.outcomes();
    match outcomes.last() {
        Some(last) if result.executed() && !result.is_interrupted() && last.is_success() => {
            if outcomes.len() == 1 {
                DirState::Present
            } else {
                DirState::Created
            }
        }
        _ => DirState::Failed,
    }
}

/// Make sure a directory exists on the selected hosts
pub async fn ensure_dir_command(
    config: &FleetConfig,
    options: EnsureDirOptions,
    cancel: CancellationToken,
) -> Result<bool> {
    let hosts = config.select_hosts(&options.hosts)?;
    if hosts.is_empty() {
        print_warning("No hosts in inventory, nothing to do");
        return Ok(true);
    }

    let pool = super::ssh_pool(config, options.concurrency, cancel);
    let path = options.path;
    let result = pool
        .run_policy(hosts, |_| EnsureDirectory::new(path.clone()))
        .await;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render(&result, &path));
        print_fleet_summary(&ensure_summary(&result));
    }

    let all_present = result.iter().all(|r| dir_state(r) != DirState::Failed);
    Ok(all_present)
}

/// One line per host
pub(crate) fn render(result: &FleetResult, path: &str) -> String {
    let mut out = String::new();
    for session in result {
        let line = match (session.error(), dir_state(session)) {
            (Some(err), _) => format!("Error: {}", err),
            (None, DirState::Present) => format!("{} exists", path),
            (None, DirState::Created) => format!("{} created", path),
            (None, DirState::Failed) => {
                let reason = session
                    .outcomes()
                    .last()
                    .map(|o| o.stderr.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| session.to_string());
                format!("failed to create {}: {}", path, reason)
            }
        };
        out.push_str(&format!("{}: {}\n", session.host(), line));
    }
    out
}

fn ensure_summary(result: &FleetResult) -> FleetSummary {
    let mut summary = FleetSummary {
        total: result.len(),
        ..Default::default()
    };
    for session in result {
        match (session.executed(), dir_state(session)) {
            (false, _) => summary.not_executed += 1,
            (true, DirState::Failed) => summary.failed += 1,
            (true, _) => summary.succeeded += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use fr_core::{CommandOutcome, SessionError};

    fn fleet() -> FleetResult {
        [
            SessionResult::completed("a", vec![CommandOutcome::new(0, "", "")]),
            SessionResult::completed(
                "b",
                vec![CommandOutcome::new(1, "", "missing"), CommandOutcome::new(0, "", "")],
            ),
            SessionResult::completed(
                "c",
                vec![
                    CommandOutcome::new(1, "", "missing"),
                    CommandOutcome::new(1, "", "mkdir: Permission denied\n"),
                ],
            ),
            SessionResult::not_executed("d", SessionError::Auth("denied".into())),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_dir_state() {
        let fleet = fleet();
        assert_eq!(dir_state(fleet.get("a").unwrap()), DirState::Present);
        assert_eq!(dir_state(fleet.get("b").unwrap()), DirState::Created);
        assert_eq!(dir_state(fleet.get("c").unwrap()), DirState::Failed);
        assert_eq!(dir_state(fleet.get("d").unwrap()), DirState::Failed);
    }

    #[test]
    fn test_render() {
        assert_eq!(
            render(&fleet(), "/srv/app"),
            "a: /srv/app exists\n\
             b: /srv/app created\n\
             c: failed to create /srv/app: mkdir: Permission denied\n\
             d: Error: authentication failed: denied\n"
        );
    }

    #[test]
    fn test_summary_counts_created_as_success() {
        let summary = ensure_summary(&fleet());
        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.not_executed, 1);
    }
}
