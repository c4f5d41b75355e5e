//! Error types for registry operations and runner capabilities.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::{InstanceKey, ServerKind};

/// Failures reported by a [`Runner`](crate::Runner) or its stop action.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerError {
	/// The address string is not valid for the protocol.
	#[error("invalid address {address:?}: {reason}")]
	InvalidAddress {
		/// Address as supplied by the caller.
		address: String,
		/// Why it was rejected.
		reason: String,
	},

	/// The listener could not be bound.
	#[error("failed to bind {address}: {source}")]
	Bind {
		/// Resolved socket address or the raw address string.
		address: String,
		/// Underlying OS error (address in use, permission denied, ...).
		#[source]
		source: std::io::Error,
	},

	/// Other I/O failure while setting up the server.
	#[error("{0}")]
	Io(#[from] std::io::Error),

	/// Teardown of a running server failed.
	#[error("teardown failed: {0}")]
	Teardown(String),
}

/// Registry operation that can be bounded by a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
	Start,
	Stop,
}

impl fmt::Display for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Start => "start",
			Self::Stop => "stop",
		})
	}
}

/// Errors returned by [`ServerRegistry`](crate::ServerRegistry) operations.
///
/// All of them are reported to the immediate caller; none is fatal to the
/// process.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
	/// No runner is registered for the requested kind.
	#[error("unsupported server type: {0}")]
	UnsupportedKind(ServerKind),

	/// The key already has a running handle. Stop it first.
	#[error("server {0} is already running")]
	AlreadyRunning(InstanceKey),

	/// Another start for the same key has not finished yet.
	#[error("server {0} is already starting")]
	StartInProgress(InstanceKey),

	/// A shutdown sweep has begun; no new server is registered.
	#[error("server {0} not started: shutting down")]
	ShuttingDown(InstanceKey),

	/// The runner could not bind or launch. No entry is left behind.
	#[error("failed to start {key} server: {source}")]
	StartFailed {
		/// Instance that failed to start.
		key: InstanceKey,
		/// Runner-reported cause.
		#[source]
		source: RunnerError,
	},

	/// No entry exists for the key.
	#[error("server {0} not found")]
	NotFound(InstanceKey),

	/// The stop action failed. The handle stays `running` so the stop can be
	/// retried.
	#[error("failed to stop server {key}: {source}")]
	StopFailed {
		/// Instance that failed to stop.
		key: InstanceKey,
		/// Runner-reported cause.
		#[source]
		source: RunnerError,
	},

	/// The runner did not finish within the configured deadline.
	#[error("{op} of server {key} timed out after {after:?}")]
	Timeout {
		/// Instance the operation targeted.
		key: InstanceKey,
		/// Operation that timed out.
		op: Operation,
		/// Configured deadline.
		after: Duration,
	},
}

/// Result type for registry operations.
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
