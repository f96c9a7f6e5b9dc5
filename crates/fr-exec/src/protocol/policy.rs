//! Policy-driven protocols

use std::collections::VecDeque;
use std::fmt;

use fr_core::CommandOutcome;

use super::{shell_quote, Step};

/// Decides the next commands for one host by looking at what just ran.
///
/// `decide` gets the outcome of the last executed command (`None` before
/// anything ran) and returns the commands to queue next. An empty list
/// ends the session.
pub trait Policy: Send {
    /// Commands to run next
    fn decide(&mut self, previous: Option<&CommandOutcome>) -> Vec<String>;

    /// Name used in logs
    fn name(&self) -> &str {
        "custom"
    }
}

struct FnPolicy<F>(F);

impl<F> Policy for FnPolicy<F>
where
    F: FnMut(Option<&CommandOutcome>) -> Vec<String> + Send,
{
    fn decide(&mut self, previous: Option<&CommandOutcome>) -> Vec<String> {
        (self.0)(previous)
    }
}

/// Protocol wrapper around a [`Policy`].
///
/// Commands returned by one `decide` call run back to back; the policy is
/// consulted again once the queue drains.
pub struct PolicyDriven {
    policy: Box<dyn Policy>,
    queued: VecDeque<String>,
    done: bool,
}

impl PolicyDriven {
    /// Wrap a policy
    pub fn new(policy: impl Policy + 'static) -> Self {
        Self {
            policy: Box::new(policy),
            queued: VecDeque::new(),
            done: false,
        }
    }

    /// Wrap a closure as a policy
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnMut(Option<&CommandOutcome>) -> Vec<String> + Send + 'static,
    {
        Self::new(FnPolicy(f))
    }

    /// Produce the next step given the previous outcome
    pub fn next(&mut self, previous: Option<&CommandOutcome>) -> Step {
        if self.done {
            return Step::Done;
        }

        if self.queued.is_empty() {
            self.queued.extend(self.policy.decide(previous));
        }

        match self.queued.pop_front() {
            Some(command) => Step::Run(command),
            None => {
                self.done = true;
                Step::Done
            }
        }
    }
}

impl fmt::Debug for PolicyDriven {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyDriven")
            .field("policy", &self.policy.name())
            .field("queued", &self.queued)
            .field("done", &self.done)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnsureState {
    Start,
    Checking,
    Creating,
    Finished,
}

/// Make sure a directory exists: `stat` it, and `mkdir` only if that failed
#[derive(Debug, Clone)]
pub struct EnsureDirectory {
    path: String,
    state: EnsureState,
}

impl EnsureDirectory {
    /// Ensure `path` exists on every host
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            state: EnsureState::Start,
        }
    }

    /// Directory being ensured
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Policy for EnsureDirectory {
    fn decide(&mut self, previous: Option<&CommandOutcome>) -> Vec<String> {
        match self.state {
            EnsureState::Start => {
                self.state = EnsureState::Checking;
                vec![format!("stat {}", shell_quote(&self.path))]
            }
            EnsureState::Checking if !previous.is_some_and(CommandOutcome::is_success) => {
                self.state = EnsureState::Creating;
                vec![format!("mkdir {}", shell_quote(&self.path))]
            }
            _ => {
                self.state = EnsureState::Finished;
                vec![]
            }
        }
    }

    fn name(&self) -> &str {
        "ensure-directory"
    }
}
