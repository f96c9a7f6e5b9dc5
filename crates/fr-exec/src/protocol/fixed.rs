//! Fixed command sequences

use fr_core::CommandOutcome;

use super::Step;

/// An ordered list of commands with a cursor.
///
/// With `stop_on_error` set, a previous outcome that did not exit zero
/// (including one with no exit status at all) ends the sequence.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    commands: Vec<String>,
    cursor: usize,
    stop_on_error: bool,
    failed: bool,
}

impl FixedSequence {
    /// Create a sequence that runs every command
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
            cursor: 0,
            stop_on_error: false,
            failed: false,
        }
    }

    /// Enable or disable stop-on-error
    pub fn stop_on_error(mut self, enabled: bool) -> Self {
        self.stop_on_error = enabled;
        self
    }

    /// Number of commands in the sequence
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the sequence has no commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Produce the next step given the previous outcome
    pub fn next(&mut self, previous: Option<&CommandOutcome>) -> Step {
        if self.stop_on_error && previous.is_some_and(|o| !o.is_success()) {
            self.failed = true;
        }
        if self.failed {
            return Step::Done;
        }

        match self.commands.get(self.cursor) {
            Some(command) => {
                self.cursor += 1;
                Step::Run(command.clone())
            }
            None => Step::Done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok() -> CommandOutcome {
        CommandOutcome::new(0, "", "")
    }

    fn fail() -> CommandOutcome {
        CommandOutcome::new(1, "", "boom")
    }

    #[test]
    fn test_empty_sequence_is_done_immediately() {
        let mut seq = FixedSequence::new(Vec::<String>::new());
        assert!(seq.is_empty());
        assert_eq!(seq.next(None), Step::Done);
    }

    #[test]
    fn test_runs_all_without_stop_on_error() {
        let mut seq = FixedSequence::new(["a", "b", "c"]);
        assert_eq!(seq.next(None), Step::Run("a".into()));
        assert_eq!(seq.next(Some(&fail())), Step::Run("b".into()));
        assert_eq!(seq.next(Some(&fail())), Step::Run("c".into()));
        assert_eq!(seq.next(Some(&fail())), Step::Done);
    }

    #[test]
    fn test_stops_after_failure() {
        let mut seq = FixedSequence::new(["a", "b", "c"]).stop_on_error(true);
        assert_eq!(seq.next(None), Step::Run("a".into()));
        assert_eq!(seq.next(Some(&ok())), Step::Run("b".into()));
        assert_eq!(seq.next(Some(&fail())), Step::Done);
        // Stays done even if asked again with a good outcome
        assert_eq!(seq.next(Some(&ok())), Step::Done);
    }

    #[test]
    fn test_missing_exit_status_counts_as_failure() {
        let mut seq = FixedSequence::new(["a", "b"]).stop_on_error(true);
        seq.next(None);
        assert_eq!(seq.next(Some(&CommandOutcome::default())), Step::Done);
    }
}
