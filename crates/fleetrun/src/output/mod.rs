//! Terminal output helpers
//!
//! Colored status lines and the host inventory table. Fleet results
//! themselves are rendered by `fr_exec::FleetResult::display` so the text
//! format stays the same for library and CLI users.

use std::io::Write;

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use tabled::{settings::Style, Table, Tabled};

use fr_core::Host;
use fr_exec::FleetSummary;

/// Format the host inventory as a table
///
/// Hosts without a username show the fleet default in parentheses.
pub fn format_hosts(hosts: &[Host], default_username: Option<&str>) -> String {
    if hosts.is_empty() {
        return "No hosts configured".to_string();
    }

    #[derive(Tabled)]
    struct HostRow {
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "ADDRESS")]
        address: String,
        #[tabled(rename = "USER")]
        user: String,
        #[tabled(rename = "AUTH")]
        auth: &'static str,
        #[tabled(rename = "TAGS")]
        tags: String,
        #[tabled(rename = "ENV")]
        env: String,
    }

    let rows: Vec<HostRow> = hosts
        .iter()
        .map(|h| HostRow {
            name: h.name.clone(),
            address: h.endpoint(),
            user: match (&h.username, default_username) {
                (Some(user), _) => user.clone(),
                (None, Some(default)) => format!("({})", default),
                (None, None) => "-".to_string(),
            },
            auth: auth_label(h),
            tags: if h.tags.is_empty() {
                "-".to_string()
            } else {
                h.tags.join(",")
            },
            env: h.env.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

fn auth_label(host: &Host) -> &'static str {
    if host.password.is_some() {
        "password"
    } else if host.key().is_some() {
        "key"
    } else {
        "default"
    }
}

/// Print the fleet-wide tally, green when everything succeeded
pub fn print_fleet_summary(summary: &FleetSummary) {
    let line = summary.to_string();
    if summary.failed == 0 && summary.not_executed == 0 {
        print_success(&line);
    } else {
        print_error(&line);
    }
}

fn print_colored<W: Write>(mut out: W, color: Color, symbol: &str, msg: &str) {
    let _ = crossterm::execute!(
        out,
        SetForegroundColor(color),
        Print(symbol),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a success message to stdout
pub fn print_success(msg: &str) {
    print_colored(std::io::stdout(), Color::Green, "✓ ", msg);
}

/// Print an error message to stderr
pub fn print_error(msg: &str) {
    print_colored(std::io::stderr(), Color::Red, "✗ ", msg);
}

/// Print a warning to stderr
pub fn print_warning(msg: &str) {
    print_colored(std::io::stderr(), Color::Yellow, "⚠ ", msg);
}

/// Print an informational message to stdout
pub fn print_info(msg: &str) {
    print_colored(std::io::stdout(), Color::Cyan, "ℹ ", msg);
}
