use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use serde::Serialize;

use crate::error::{Operation, RegistryError, Result};
use crate::runner::{Started, StopServer};
use crate::snapshot::ServerSnapshot;
use crate::{InstanceKey, ServerKind};

/// Lifecycle state of one server instance.
///
/// There is no transient `starting` state: a handle only exists once its
/// runner returned successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
	Running,
	Stopped,
}

impl ServerStatus {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Running => "running",
			Self::Stopped => "stopped",
		}
	}
}

impl fmt::Display for ServerStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(self.as_str())
	}
}

/// What a successful [`ServerHandle::stop`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopOutcome {
	/// The stop action ran and succeeded.
	Stopped,
	/// The handle was already stopped; nothing ran.
	AlreadyStopped,
}

/// The registry's record of one server instance.
///
/// Two locks, never held together across an await:
/// - `status` is a short synchronous lock read by [`ServerRegistry::list`](crate::ServerRegistry::list).
/// - `stop` is the lifecycle lock, held for the whole duration of a stop call
///   so stops of the same instance serialize without blocking other keys.
pub struct ServerHandle {
	key: InstanceKey,
	local_addr: SocketAddr,
	status: parking_lot::Mutex<ServerStatus>,
	stop: tokio::sync::Mutex<Option<Box<dyn StopServer>>>,
}

impl ServerHandle {
	pub(crate) fn running(key: InstanceKey, started: Started) -> Self {
		Self {
			key,
			local_addr: started.local_addr,
			status: parking_lot::Mutex::new(ServerStatus::Running),
			stop: tokio::sync::Mutex::new(Some(started.stop)),
		}
	}

	pub fn key(&self) -> &InstanceKey {
		&self.key
	}

	pub fn kind(&self) -> &ServerKind {
		self.key.kind()
	}

	pub fn address(&self) -> &str {
		self.key.address()
	}

	/// Socket address the runner bound.
	pub fn local_addr(&self) -> SocketAddr {
		self.local_addr
	}

	pub fn status(&self) -> ServerStatus {
		*self.status.lock()
	}

	pub(crate) fn snapshot(&self) -> ServerSnapshot {
		ServerSnapshot {
			kind: self.kind().clone(),
			address: self.address().to_owned(),
			status: self.status(),
		}
	}

	/// Runs the stop action under the lifecycle lock.
	///
	/// Stopping a stopped handle is a no-op. On failure or timeout the status
	/// stays `running` and the action is kept for a retry; on success the
	/// action is dropped so it can never run twice.
	pub(crate) async fn stop(&self, deadline: Option<Duration>) -> Result<StopOutcome> {
		let mut action = self.stop.lock().await;
		if self.status() == ServerStatus::Stopped {
			return Ok(StopOutcome::AlreadyStopped);
		}

		let Some(stop) = action.as_mut() else {
			*self.status.lock() = ServerStatus::Stopped;
			return Ok(StopOutcome::Stopped);
		};

		let result = match deadline {
			Some(after) => tokio::time::timeout(after, stop.stop()).await.map_err(|_| RegistryError::Timeout {
				key: self.key.clone(),
				op: Operation::Stop,
				after,
			})?,
			None => stop.stop().await,
		};

		match result {
			Ok(()) => {
				*action = None;
				*self.status.lock() = ServerStatus::Stopped;
				Ok(StopOutcome::Stopped)
			}
			Err(source) => Err(RegistryError::StopFailed {
				key: self.key.clone(),
				source,
			}),
		}
	}
}

impl fmt::Debug for ServerHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ServerHandle")
			.field("key", &self.key)
			.field("local_addr", &self.local_addr)
			.field("status", &self.status())
			.finish_non_exhaustive()
	}
}
