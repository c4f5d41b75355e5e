//! Maps parsed commands onto registry calls.

use downstream_registry::{InstanceKey, ServerRegistry};
use tracing::{debug, info};

use crate::Command;
use crate::table::render_rows;

/// What the console should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
	/// Print this text and keep reading.
	Reply(String),
	/// Begin shutdown.
	Exit,
}

/// Runs `command` against `registry`.
///
/// Registry failures become an `Error: ...` reply; nothing here ends the
/// process except [`Command::Exit`].
pub async fn dispatch(registry: &ServerRegistry, command: Command) -> Outcome {
	debug!(?command, "console command");
	let reply = match command {
		Command::Start { kind, address } => match registry.start(kind, &address).await {
			Ok(handle) => {
				info!(key = %handle.key(), local_addr = %handle.local_addr(), "started from console");
				format!("started {} on {}", handle.key(), handle.local_addr())
			}
			Err(error) => format!("Error: {error}"),
		},
		Command::Stop { kind, address } => {
			let key = InstanceKey::new(kind.clone(), address.as_str());
			match registry.stop(kind, &address).await {
				Ok(()) => format!("stopped {key}"),
				Err(error) => format!("Error: {error}"),
			}
		}
		Command::List => render_rows(&registry.list()).trim_end().to_owned(),
		Command::Help => help(registry),
		Command::Exit => return Outcome::Exit,
	};
	Outcome::Reply(reply)
}

fn help(registry: &ServerRegistry) -> String {
	let kinds: Vec<_> = registry.runners().kinds().iter().map(ToString::to_string).collect();
	format!(
		"Commands:\n  start <type> <address>\n  stop <type> <address>\n  list\n  exit\nTypes: {}",
		kinds.join(", ")
	)
}
