//! Remote session
//!
//! A [`RemoteSession`] runs one host's command protocol to completion and
//! turns every failure into a classified [`SessionResult`]. Nothing it does
//! returns an error to the caller.
//!
//! # Lifecycle
//!
//! 1. Resolve credentials through the [`CredentialProvider`]
//! 2. Connect (network / auth / unclassified failures end the session here)
//! 3. Ask the protocol for a command, run it, feed the outcome back, repeat
//! 4. Close the connection, exactly once, however step 3 ended
//!
//! A protocol that panics ends the session like any other failure: the
//! connection is still closed and the host reports
//! [`SessionError::Unclassified`]. This relies on unwinding, so it does not
//! apply to builds with `panic = "abort"`.
//!
//! The cancellation token is watched while connecting and while a command
//! runs. A cancelled session drops its partial outcomes and reports
//! [`SessionError::Cancelled`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use fr_core::traits::{Connection, Transport};
use fr_core::{CommandOutcome, CredentialProvider, Host, SessionError};

use crate::protocol::{CommandProtocol, Step};
use crate::result::SessionResult;

/// How the protocol loop ended
enum DriveEnd {
    Exhausted(Vec<CommandOutcome>),
    Interrupted(Vec<CommandOutcome>),
    Cancelled,
    ProtocolPanicked(String),
}

/// One host's protocol run
pub struct RemoteSession<T: Transport> {
    transport: Arc<T>,
    credentials: Arc<dyn CredentialProvider>,
    host: Host,
    protocol: CommandProtocol,
    cancel: CancellationToken,
}

impl<T: Transport> RemoteSession<T> {
    /// Create a session for `host`
    pub fn new(
        transport: Arc<T>,
        credentials: Arc<dyn CredentialProvider>,
        host: Host,
        protocol: CommandProtocol,
    ) -> Self {
        Self {
            transport,
            credentials,
            host,
            protocol,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop the session when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Host this session targets
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Run the session to completion
    #[tracing::instrument(name = "session", skip_all, fields(host = %self.host.name))]
    pub async fn run(mut self) -> SessionResult {
        let started = Instant::now();
        let name = self.host.name.clone();

        if self.cancel.is_cancelled() {
            return SessionResult::not_executed(name, SessionError::Cancelled);
        }

        let credential = match self.credentials.resolve(&self.host) {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(error = %e, "Credential resolution failed");
                return SessionResult::not_executed(name, SessionError::Unclassified(e.to_string()));
            }
        };

        tracing::debug!(
            endpoint = %self.host.endpoint(),
            user = %credential.username,
            method = credential.method(),
            "Connecting"
        );

        let connected = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            res = self.transport.connect(&self.host, &credential) => Some(res),
        };

        let mut conn = match connected {
            None => {
                tracing::info!("Cancelled while connecting");
                return SessionResult::not_executed(name, SessionError::Cancelled);
            }
            Some(Err(e)) => {
                let err = SessionError::from(e);
                tracing::warn!(kind = err.kind(), error = %err, "Connection failed");
                return SessionResult::not_executed(name, err);
            }
            Some(Ok(conn)) => conn,
        };

        let end = self.drive(&mut conn).await;
        conn.close().await;

        let result = match end {
            DriveEnd::Exhausted(outcomes) => SessionResult::completed(name, outcomes),
            DriveEnd::Interrupted(outcomes) => SessionResult::interrupted(name, outcomes),
            DriveEnd::Cancelled => SessionResult::not_executed(name, SessionError::Cancelled),
            DriveEnd::ProtocolPanicked(msg) => SessionResult::not_executed(
                name,
                SessionError::Unclassified(format!("command protocol panicked: {}", msg)),
            ),
        };

        tracing::info!(
            commands = result.outcomes().len(),
            success = result.success(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Session finished"
        );

        result
    }

    async fn drive(&mut self, conn: &mut T::Conn) -> DriveEnd {
        let mut outcomes: Vec<CommandOutcome> = Vec::new();

        loop {
            let protocol = &mut self.protocol;
            let step = panic::catch_unwind(AssertUnwindSafe(|| protocol.next(outcomes.last())));
            let command = match step {
                Ok(Step::Run(command)) => command,
                Ok(Step::Done) => return DriveEnd::Exhausted(outcomes),
                Err(payload) => {
                    let msg = panic_message(payload.as_ref());
                    tracing::error!(error = %msg, "Command protocol panicked");
                    return DriveEnd::ProtocolPanicked(msg);
                }
            };

            tracing::debug!(command = %command, "Executing");

            let executed = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                res = conn.execute(&command) => Some(res),
            };

            match executed {
                None => {
                    tracing::info!(command = %command, "Cancelled while executing");
                    return DriveEnd::Cancelled;
                }
                Some(Ok(outcome)) => {
                    tracing::debug!(
                        command = %command,
                        exit_code = ?outcome.exit_code,
                        stdout_bytes = outcome.stdout.len(),
                        stderr_bytes = outcome.stderr.len(),
                        "Command finished"
                    );
                    outcomes.push(outcome);
                }
                Some(Err(e)) => {
                    tracing::warn!(
                        command = %command,
                        completed = outcomes.len(),
                        error = %e,
                        "Session interrupted"
                    );
                    return DriveEnd::Interrupted(outcomes);
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
