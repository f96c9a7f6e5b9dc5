//! Plain-text rendering of fleet results

use std::fmt::{self, Write};

use super::{FleetResult, SessionResult};

/// What to include when rendering a [`FleetResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Print stdout lines as `host<<out>>: line`
    pub show_stdout: bool,
    /// Print stderr lines as `host<<err>>: line`
    pub show_stderr: bool,
    /// Print `host: Success` / `host: Failed` per host
    pub show_summary: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_stdout: false,
            show_stderr: false,
            show_summary: true,
        }
    }
}

impl DisplayOptions {
    /// Everything on
    pub fn verbose() -> Self {
        Self {
            show_stdout: true,
            show_stderr: true,
            show_summary: true,
        }
    }
}

impl FleetResult {
    /// Render the result as text, one line per entry, hosts in name order.
    ///
    /// Hosts that never executed always get their error line, whatever the
    /// summary setting.
    pub fn display(&self, options: &DisplayOptions) -> String {
        let mut out = String::new();
        for result in self {
            // Writing to a String can't fail
            let _ = write_session(&mut out, result, options);
        }
        out
    }
}

fn write_session(out: &mut String, result: &SessionResult, options: &DisplayOptions) -> fmt::Result {
    let host = result.host();

    for outcome in result.outcomes() {
        if options.show_stdout {
            for line in outcome.stdout.lines() {
                writeln!(out, "{}<<out>>: {}", host, line)?;
            }
        }
        if options.show_stderr {
            for line in outcome.stderr.lines() {
                writeln!(out, "{}<<err>>: {}", host, line)?;
            }
        }
    }

    if options.show_summary || !result.executed() {
        writeln!(out, "{}: {}", host, result)?;
    }

    Ok(())
}
