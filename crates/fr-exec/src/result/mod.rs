//! Session and fleet results

mod format;

pub use format::DisplayOptions;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use fr_core::{CommandOutcome, SessionError};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Final state of one host's session.
///
/// Either the session executed (it connected and ran its protocol, maybe
/// partially) and `error` is unset, or it did not execute, `outcomes` is
/// empty, and `error` says why. The constructors are the only way to build
/// one, so the two shapes can't be mixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResult {
    host: String,
    executed: bool,
    outcomes: Vec<CommandOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<SessionError>,
    #[serde(skip_serializing_if = "is_false")]
    interrupted: bool,
}

impl SessionResult {
    /// The protocol ran to completion
    pub fn completed(host: impl Into<String>, outcomes: Vec<CommandOutcome>) -> Self {
        Self {
            host: host.into(),
            executed: true,
            outcomes,
            error: None,
            interrupted: false,
        }
    }

    /// The connection failed partway through the protocol
    pub fn interrupted(host: impl Into<String>, outcomes: Vec<CommandOutcome>) -> Self {
        Self {
            interrupted: true,
            ..Self::completed(host, outcomes)
        }
    }

    /// The session never got to run its protocol
    pub fn not_executed(host: impl Into<String>, error: SessionError) -> Self {
        Self {
            host: host.into(),
            executed: false,
            outcomes: Vec::new(),
            error: Some(error),
            interrupted: false,
        }
    }

    /// Host name
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether the session connected and ran its protocol
    pub fn executed(&self) -> bool {
        self.executed
    }

    /// Outcomes in execution order
    pub fn outcomes(&self) -> &[CommandOutcome] {
        &self.outcomes
    }

    /// Why the session did not execute
    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    /// Whether the protocol was cut short by a connection failure
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Executed, and every command exited zero
    pub fn success(&self) -> bool {
        self.executed && self.outcomes.iter().all(CommandOutcome::is_success)
    }
}

impl fmt::Display for SessionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(err) => write!(f, "Error: {}", err)?,
            None if self.success() => write!(f, "Success")?,
            None => write!(f, "Failed")?,
        }
        if self.interrupted {
            write!(f, " (interrupted)")?;
        }
        Ok(())
    }
}

/// Counts over a fleet result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FleetSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub not_executed: usize,
}

impl fmt::Display for FleetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hosts: {} succeeded, {} failed, {} not executed",
            self.total, self.succeeded, self.failed, self.not_executed
        )
    }
}

/// Results of a fleet run, one per distinct host, ordered by host name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FleetResult {
    results: BTreeMap<String, SessionResult>,
}

impl FleetResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a session result, replacing any earlier one for the same host
    pub(crate) fn insert(&mut self, result: SessionResult) {
        self.results.insert(result.host.clone(), result);
    }

    /// Number of hosts
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no hosts were run
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result for one host
    pub fn get(&self, host: &str) -> Option<&SessionResult> {
        self.results.get(host)
    }

    /// Whether a host has a result
    pub fn contains(&self, host: &str) -> bool {
        self.results.contains_key(host)
    }

    /// Results ordered by host name
    pub fn iter(&self) -> impl Iterator<Item = &SessionResult> {
        self.results.values()
    }

    /// True only if every session succeeded
    pub fn success(&self) -> bool {
        self.iter().all(SessionResult::success)
    }

    /// Names of hosts whose session did not succeed
    pub fn failed_hosts(&self) -> Vec<&str> {
        self.iter()
            .filter(|r| !r.success())
            .map(SessionResult::host)
            .collect()
    }

    /// Count successes and failures
    pub fn summary(&self) -> FleetSummary {
        self.iter().fold(
            FleetSummary {
                total: self.len(),
                ..Default::default()
            },
            |mut acc, r| {
                if !r.executed() {
                    acc.not_executed += 1;
                } else if r.success() {
                    acc.succeeded += 1;
                } else {
                    acc.failed += 1;
                }
                acc
            },
        )
    }
}

impl FromIterator<SessionResult> for FleetResult {
    fn from_iter<I: IntoIterator<Item = SessionResult>>(iter: I) -> Self {
        let mut fleet = FleetResult::new();
        for result in iter {
            fleet.insert(result);
        }
        fleet
    }
}

impl<'a> IntoIterator for &'a FleetResult {
    type Item = &'a SessionResult;
    type IntoIter = std::collections::btree_map::Values<'a, String, SessionResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.values()
    }
}
