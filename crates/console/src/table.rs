//! Status table rendering.

use std::fmt::Write;
use std::time::Duration;

use downstream_registry::ServerSnapshot;

const TOP: &str = "┌───────────────┬───────────────────┬───────────────┐";
const HEADER: &str = "│     Type      │   Address/Port    │     Status    │";
const DIVIDER: &str = "├───────────────┼───────────────────┼───────────────┤";
const BOTTOM: &str = "└───────────────┴───────────────────┴───────────────┘";
const FOOTER: &str = "Enter commands: start [type] [address], stop [type] [address], list, exit";

/// Box-drawn table of `rows`, one line per server.
pub fn render_rows(rows: &[ServerSnapshot]) -> String {
	let mut out = String::new();
	for line in [TOP, HEADER, DIVIDER] {
		out.push_str(line);
		out.push('\n');
	}
	for row in rows {
		let _ = writeln!(out, "│ {:<13} │ {:<17} │ {:<13} │", row.kind, row.address, row.status);
	}
	out.push_str(BOTTOM);
	out.push('\n');
	out
}

/// Full monitor screen: uptime line, table, and the command hint.
pub fn render_table(rows: &[ServerSnapshot], uptime: Duration) -> String {
	let mut out = format!("The service has been running continuously for {} seconds.\n", uptime.as_secs());
	out.push_str(&render_rows(rows));
	out.push_str(FOOTER);
	out.push('\n');
	out
}
