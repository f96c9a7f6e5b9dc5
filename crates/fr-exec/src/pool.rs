//! Execution pool
//!
//! Fans a command protocol out to a list of hosts with a bound on how many
//! sessions run at once. Hosts wait in a pending queue; finished sessions
//! free a slot and the next host is started straight away.
//!
//! Only the pool loop touches the pending queue, the active set and the
//! [`FleetResult`]. Sessions own their connection and hand back a
//! [`SessionResult`] when they finish.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use fr_core::config::{ExecutionConfig, DEFAULT_MAX_CONCURRENCY};
use fr_core::traits::Transport;
use fr_core::{CredentialProvider, Host, SessionError};

use crate::protocol::{CommandProtocol, FixedSequence, Policy, PolicyDriven};
use crate::result::{FleetResult, SessionResult};
use crate::session::RemoteSession;

/// Bounded-concurrency fan-out over a transport
pub struct ExecutionPool<T: Transport> {
    transport: Arc<T>,
    credentials: Arc<dyn CredentialProvider>,
    max_concurrency: usize,
    cancel: CancellationToken,
}

impl<T: Transport> ExecutionPool<T> {
    /// Create a pool running at most 10 sessions at once
    pub fn new(transport: T, credentials: impl CredentialProvider + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            credentials: Arc::new(credentials),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the concurrency bound; values below 1 mean 1
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Take tuning from the `[execution]` config section
    pub fn with_config(self, config: &ExecutionConfig) -> Self {
        self.with_max_concurrency(config.max_concurrency)
    }

    /// Use an external cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels every run on this pool
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Configured concurrency bound
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run a protocol on every host.
    ///
    /// `factory` is called once per distinct host to build that host's
    /// protocol. A host is identified by its name: a later host with a name
    /// already seen is skipped, even if its address or port differ. The
    /// returned result has exactly one entry per distinct name.
    pub async fn run<I, F>(&self, hosts: I, mut factory: F) -> FleetResult
    where
        I: IntoIterator<Item = Host>,
        F: FnMut(&Host) -> CommandProtocol,
    {
        let started = Instant::now();

        let mut seen = HashSet::new();
        let mut pending = VecDeque::new();
        for host in hosts {
            if seen.insert(host.name.clone()) {
                pending.push_back(host);
            } else {
                tracing::warn!(
                    host = %host.name,
                    endpoint = %host.endpoint(),
                    "Duplicate host name ignored"
                );
            }
        }

        let submitted: Vec<String> = pending.iter().map(|h| h.name.clone()).collect();
        let limit = self.max_concurrency.min(pending.len()).max(1);

        tracing::info!(hosts = submitted.len(), concurrency = limit, "Starting fleet run");

        let mut active = JoinSet::new();
        let mut fleet = FleetResult::new();

        loop {
            while active.len() < limit {
                let Some(host) = pending.pop_front() else {
                    break;
                };

                if self.cancel.is_cancelled() {
                    fleet.insert(SessionResult::not_executed(host.name, SessionError::Cancelled));
                    continue;
                }

                let protocol = factory(&host);
                let session = RemoteSession::new(
                    Arc::clone(&self.transport),
                    Arc::clone(&self.credentials),
                    host,
                    protocol,
                )
                .with_cancellation(self.cancel.clone());

                active.spawn(session.run());
            }

            match active.join_next().await {
                Some(Ok(result)) => {
                    tracing::debug!(
                        host = %result.host(),
                        status = %result,
                        remaining = pending.len() + active.len(),
                        "Session complete"
                    );
                    fleet.insert(result);
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Session task failed");
                }
                None => break,
            }
        }

        // A task that panicked outside the protocol left no result behind
        for name in submitted {
            if !fleet.contains(&name) {
                fleet.insert(SessionResult::not_executed(
                    name,
                    SessionError::Unclassified("session task terminated unexpectedly".to_string()),
                ));
            }
        }

        let summary = fleet.summary();
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            not_executed = summary.not_executed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fleet run finished"
        );

        fleet
    }

    /// Run one command on every host
    pub async fn run_command<I>(&self, hosts: I, command: impl Into<String>) -> FleetResult
    where
        I: IntoIterator<Item = Host>,
    {
        let command = command.into();
        self.run(hosts, |_| CommandProtocol::commands([command.clone()]))
            .await
    }

    /// Run a list of commands on every host
    pub async fn run_commands<I>(&self, hosts: I, commands: &[String], stop_on_error: bool) -> FleetResult
    where
        I: IntoIterator<Item = Host>,
    {
        self.run(hosts, |_| {
            FixedSequence::new(commands.iter().cloned())
                .stop_on_error(stop_on_error)
                .into()
        })
        .await
    }

    /// Drive every host with its own policy instance
    pub async fn run_policy<I, F, P>(&self, hosts: I, mut make_policy: F) -> FleetResult
    where
        I: IntoIterator<Item = Host>,
        F: FnMut(&Host) -> P,
        P: Policy + 'static,
    {
        self.run(hosts, |host| PolicyDriven::new(make_policy(host)).into())
            .await
    }
}
