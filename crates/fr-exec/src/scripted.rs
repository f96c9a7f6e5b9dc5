//! In-memory scripted transport
//!
//! [`ScriptedTransport`] stands in for SSH in tests and embeddings. Each
//! host gets a [`HostScript`] describing how connecting behaves and what
//! each command returns. Hosts without a script are unreachable.
//!
//! The transport also keeps [`TransportStats`], so callers can check how
//! many connections were opened and closed, the highest number open at
//! once, and which commands ran where.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fr_core::error::{ChannelError, ConnectError};
use fr_core::traits::{Connection, Transport};
use fr_core::{CommandOutcome, Credential, Host};

#[derive(Debug, Clone)]
enum ConnectBehavior {
    Accept,
    Network(String),
    Auth(String),
    Other(String),
}

/// Scripted behavior for one host
#[derive(Debug, Clone)]
pub struct HostScript {
    connect: ConnectBehavior,
    connect_delay: Duration,
    responses: HashMap<String, CommandOutcome>,
    default_outcome: CommandOutcome,
    drop_after: Option<usize>,
    delay: Duration,
}

impl HostScript {
    fn with_connect(connect: ConnectBehavior) -> Self {
        Self {
            connect,
            connect_delay: Duration::ZERO,
            responses: HashMap::new(),
            default_outcome: CommandOutcome::new(0, "", ""),
            drop_after: None,
            delay: Duration::ZERO,
        }
    }

    /// Host accepts connections; unknown commands exit 0 silently
    pub fn reachable() -> Self {
        Self::with_connect(ConnectBehavior::Accept)
    }

    /// Host can't be reached
    pub fn unreachable() -> Self {
        Self::with_connect(ConnectBehavior::Network("connection refused".to_string()))
    }

    /// Host rejects every credential
    pub fn reject_auth() -> Self {
        Self::with_connect(ConnectBehavior::Auth("credentials rejected".to_string()))
    }

    /// Connecting fails for some other reason
    pub fn fail(message: impl Into<String>) -> Self {
        Self::with_connect(ConnectBehavior::Other(message.into()))
    }

    /// Reply to `command` with `outcome`
    pub fn respond(mut self, command: impl Into<String>, outcome: CommandOutcome) -> Self {
        self.responses.insert(command.into(), outcome);
        self
    }

    /// Reply to commands without a scripted response with `outcome`
    pub fn default_outcome(mut self, outcome: CommandOutcome) -> Self {
        self.default_outcome = outcome;
        self
    }

    /// Drop the connection once `n` commands have completed
    pub fn drop_after(mut self, n: usize) -> Self {
        self.drop_after = Some(n);
        self
    }

    /// Each command takes this long
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Connecting takes this long
    pub fn connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }
}

/// Counters shared by a transport and its connections
#[derive(Debug, Default)]
pub struct TransportStats {
    connects: AtomicUsize,
    closes: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    commands: Mutex<HashMap<String, Vec<String>>>,
}

impl TransportStats {
    /// Connection attempts, successful or not
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Calls to `close`
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Highest number of hosts being worked on at the same time
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Commands executed on `host`, in order
    pub fn commands(&self, host: &str) -> Vec<String> {
        self.lock_commands().get(host).cloned().unwrap_or_default()
    }

    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    fn record(&self, host: &str, command: &str) {
        self.lock_commands()
            .entry(host.to_string())
            .or_default()
            .push(command.to_string());
    }

    fn lock_commands(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<String>>> {
        self.commands.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Transport answering from per-host scripts
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    scripts: Arc<HashMap<String, HostScript>>,
    stats: Arc<TransportStats>,
}

impl ScriptedTransport {
    /// Transport where every host is unreachable
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a host
    pub fn host(mut self, name: impl Into<String>, script: HostScript) -> Self {
        Arc::make_mut(&mut self.scripts).insert(name.into(), script);
        self
    }

    /// Shared counters
    pub fn stats(&self) -> Arc<TransportStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    type Conn = ScriptedConnection;

    async fn connect(
        &self,
        host: &Host,
        _credential: &Credential,
    ) -> Result<ScriptedConnection, ConnectError> {
        self.stats.connects.fetch_add(1, Ordering::SeqCst);

        let script = match self.scripts.get(&host.name) {
            Some(script) => script.clone(),
            None => {
                return Err(ConnectError::Network(format!(
                    "no route to host {}",
                    host.endpoint()
                )))
            }
        };

        self.stats.enter();
        if !script.connect_delay.is_zero() {
            tokio::time::sleep(script.connect_delay).await;
        }

        let refused = match &script.connect {
            ConnectBehavior::Accept => None,
            ConnectBehavior::Network(msg) => Some(ConnectError::Network(msg.clone())),
            ConnectBehavior::Auth(msg) => Some(ConnectError::Auth(msg.clone())),
            ConnectBehavior::Other(msg) => Some(ConnectError::Other(msg.clone())),
        };
        if let Some(err) = refused {
            self.stats.leave();
            return Err(err);
        }

        Ok(ScriptedConnection {
            host: host.name.clone(),
            script,
            completed: 0,
            closed: false,
            stats: Arc::clone(&self.stats),
        })
    }
}

/// Connection produced by [`ScriptedTransport`]
#[derive(Debug)]
pub struct ScriptedConnection {
    host: String,
    script: HostScript,
    completed: usize,
    closed: bool,
    stats: Arc<TransportStats>,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn execute(&mut self, command: &str) -> Result<CommandOutcome, ChannelError> {
        if self.closed {
            return Err(ChannelError::Open("connection closed".to_string()));
        }
        if self.script.drop_after.is_some_and(|n| self.completed >= n) {
            return Err(ChannelError::ConnectionLost(format!(
                "{} hung up",
                self.host
            )));
        }

        if !self.script.delay.is_zero() {
            tokio::time::sleep(self.script.delay).await;
        }

        self.stats.record(&self.host, command);
        self.completed += 1;

        Ok(self
            .script
            .responses
            .get(command)
            .cloned()
            .unwrap_or_else(|| self.script.default_outcome.clone()))
    }

    async fn close(&mut self) {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        if !self.closed {
            self.closed = true;
            self.stats.leave();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fr_core::{CredentialProvider, FleetCredentials};

    fn credential(host: &Host) -> Credential {
        FleetCredentials::new()
            .with_default_username("u")
            .resolve(&host.clone().with_password("p"))
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_host_is_unreachable() {
        let transport = ScriptedTransport::new();
        let host = Host::new("ghost");
        let err = transport.connect(&host, &credential(&host)).await.unwrap_err();
        assert!(matches!(err, ConnectError::Network(_)));
        assert_eq!(transport.stats().connects(), 1);
    }

    #[tokio::test]
    async fn test_scripted_responses_and_recording() {
        let transport = ScriptedTransport::new().host(
            "a",
            HostScript::reachable()
                .respond("hostname", CommandOutcome::new(0, "a\n", ""))
                .default_outcome(CommandOutcome::new(127, "", "not found\n")),
        );
        let host = Host::new("a");
        let mut conn = transport.connect(&host, &credential(&host)).await.unwrap();

        assert_eq!(conn.execute("hostname").await.unwrap().stdout, "a\n");
        assert_eq!(conn.execute("nope").await.unwrap().exit_code, Some(127));
        conn.close().await;

        let stats = transport.stats();
        assert_eq!(stats.commands("a"), vec!["hostname", "nope"]);
        assert_eq!(stats.closes(), 1);
        assert_eq!(stats.max_active(), 1);
    }

    #[tokio::test]
    async fn test_drop_after() {
        let transport = ScriptedTransport::new().host("a", HostScript::reachable().drop_after(1));
        let host = Host::new("a");
        let mut conn = transport.connect(&host, &credential(&host)).await.unwrap();

        assert!(conn.execute("one").await.is_ok());
        assert!(matches!(
            conn.execute("two").await,
            Err(ChannelError::ConnectionLost(_))
        ));
        assert_eq!(transport.stats().commands("a"), vec!["one"]);
    }
}
