//! Console command grammar.

use downstream_registry::ServerKind;
use thiserror::Error;

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	Start { kind: ServerKind, address: String },
	Stop { kind: ServerKind, address: String },
	List,
	Help,
	Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
	/// `start` or `stop` with the wrong number of arguments.
	#[error("Usage: {0} <type> <address>")]
	Usage(&'static str),

	#[error("Unknown command. Available: start, stop, list, exit")]
	Unknown(String),
}

impl Command {
	/// Parses a whitespace-separated line. Blank lines parse to `None`.
	pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
		let words: Vec<&str> = line.split_whitespace().collect();
		let Some((&verb, args)) = words.split_first() else {
			return Ok(None);
		};

		let command = match verb {
			"start" => {
				let (kind, address) = kind_and_address("start", args)?;
				Self::Start { kind, address }
			}
			"stop" => {
				let (kind, address) = kind_and_address("stop", args)?;
				Self::Stop { kind, address }
			}
			"list" | "ls" => Self::List,
			"help" => Self::Help,
			"exit" | "quit" => Self::Exit,
			other => return Err(CommandError::Unknown(other.to_owned())),
		};
		Ok(Some(command))
	}
}

fn kind_and_address(verb: &'static str, args: &[&str]) -> Result<(ServerKind, String), CommandError> {
	match args {
		[kind, address] => Ok((ServerKind::new(kind), (*address).to_owned())),
		_ => Err(CommandError::Usage(verb)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_start_and_stop() {
		assert_eq!(
			Command::parse("start tcp 9001").unwrap(),
			Some(Command::Start {
				kind: ServerKind::TCP,
				address: "9001".into()
			})
		);
		assert_eq!(
			Command::parse("  stop   HTTP  127.0.0.1:8080 ").unwrap(),
			Some(Command::Stop {
				kind: ServerKind::HTTP,
				address: "127.0.0.1:8080".into()
			})
		);
	}

	#[test]
	fn parses_aliases() {
		assert_eq!(Command::parse("ls").unwrap(), Some(Command::List));
		assert_eq!(Command::parse("quit").unwrap(), Some(Command::Exit));
		assert_eq!(Command::parse("exit").unwrap(), Some(Command::Exit));
	}

	#[test]
	fn blank_lines_are_ignored() {
		assert_eq!(Command::parse("").unwrap(), None);
		assert_eq!(Command::parse(" \t ").unwrap(), None);
	}

	#[test]
	fn wrong_arity_is_a_usage_error() {
		let err = Command::parse("start tcp").unwrap_err();
		assert_eq!(err.to_string(), "Usage: start <type> <address>");

		let err = Command::parse("stop tcp 1 2").unwrap_err();
		assert_eq!(err.to_string(), "Usage: stop <type> <address>");
	}

	#[test]
	fn unknown_verbs_list_the_available_commands() {
		let err = Command::parse("restart tcp 9001").unwrap_err();
		assert_eq!(err, CommandError::Unknown("restart".into()));
		assert_eq!(err.to_string(), "Unknown command. Available: start, stop, list, exit");
	}
}
