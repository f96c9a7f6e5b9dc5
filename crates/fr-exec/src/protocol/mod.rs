//! Command protocols
//!
//! A protocol decides what a session runs next. The session calls
//! [`CommandProtocol::next`] with the outcome of the previous command
//! (`None` on the first call) and runs whatever comes back, until the
//! protocol answers [`Step::Done`].
//!
//! Protocols carry per-session state (a cursor, an error flag, a policy's
//! progress), so every session gets its own instance.

mod fixed;
mod policy;

pub use fixed::FixedSequence;
pub use policy::{EnsureDirectory, Policy, PolicyDriven};

use fr_core::CommandOutcome;

/// What a session should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Run this command
    Run(String),
    /// Nothing left to run
    Done,
}

/// Decision logic producing the next command of a session
#[derive(Debug)]
pub enum CommandProtocol {
    /// A fixed list of commands
    FixedSequence(FixedSequence),
    /// Commands chosen by a policy after inspecting earlier outcomes
    PolicyDriven(PolicyDriven),
}

impl CommandProtocol {
    /// Run every command in order regardless of exit codes
    pub fn commands<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FixedSequence::new(commands).into()
    }

    /// Run commands in order, stopping after the first failure
    pub fn commands_stop_on_error<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FixedSequence::new(commands).stop_on_error(true).into()
    }

    /// Drive the session with a policy
    pub fn policy(policy: impl Policy + 'static) -> Self {
        PolicyDriven::new(policy).into()
    }

    /// Produce the next step given the previous outcome
    pub fn next(&mut self, previous: Option<&CommandOutcome>) -> Step {
        match self {
            CommandProtocol::FixedSequence(p) => p.next(previous),
            CommandProtocol::PolicyDriven(p) => p.next(previous),
        }
    }
}

impl From<FixedSequence> for CommandProtocol {
    fn from(p: FixedSequence) -> Self {
        CommandProtocol::FixedSequence(p)
    }
}

impl From<PolicyDriven> for CommandProtocol {
    fn from(p: PolicyDriven) -> Self {
        CommandProtocol::PolicyDriven(p)
    }
}

/// Quote a string for a POSIX shell
pub(crate) fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
