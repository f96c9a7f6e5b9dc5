//! fr-exec: Fleet execution engine
//!
//! Runs a command protocol against many hosts at once. Each host gets its
//! own [`RemoteSession`]; the [`ExecutionPool`] bounds how many sessions
//! are active, and collects every [`SessionResult`] into a [`FleetResult`].
//!
//! ```ignore
//! let pool = ExecutionPool::new(SshTransport::new(&config.execution, config.host_keys), creds)
//!     .with_max_concurrency(5);
//! let result = pool.run_command(hosts, "uptime").await;
//! println!("{}", result.display(&DisplayOptions::default()));
//! ```

pub mod pool;
pub mod protocol;
pub mod result;
pub mod scripted;
pub mod session;
pub mod ssh;

pub use pool::ExecutionPool;
pub use protocol::{CommandProtocol, EnsureDirectory, FixedSequence, Policy, PolicyDriven, Step};
pub use result::{DisplayOptions, FleetResult, FleetSummary, SessionResult};
pub use session::RemoteSession;
pub use ssh::SshTransport;
