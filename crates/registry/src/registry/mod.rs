//! The server registry: one map from [`InstanceKey`] to [`ServerHandle`].
//!
//! # Lock partition
//!
//! | Lock | Kind | Guards | Held across `.await` |
//! |---|---|---|---|
//! | `ServerRegistry::state` | `parking_lot::Mutex` | map structure and start reservations | never |
//! | `ServerHandle` status | `parking_lot::Mutex` | one handle's status | never |
//! | `ServerHandle` lifecycle | `tokio::sync::Mutex` | one handle's stop action | yes, for the stop call |
//!
//! Runner calls and stop calls always happen outside the registry lock, so a
//! slow bind or teardown on one key never delays any other key.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{Operation, RegistryError, Result, RunnerError};
use crate::handle::{ServerHandle, ServerStatus, StopOutcome};
use crate::runner::{RunnerSet, ServeSettings, Started};
use crate::snapshot::ServerSnapshot;
use crate::{InstanceKey, ServerKind};


/// Optional deadlines for runner calls.
///
/// `None` leaves the operation unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryConfig {
	/// Bound on a runner's `start` call.
	pub start_timeout: Option<Duration>,
	/// Bound on one handle's stop action.
	pub stop_timeout: Option<Duration>,
}

/// Outcome of [`ServerRegistry::stop_all`].
#[derive(Debug, Default)]
pub struct StopAllReport {
	/// Handles whose stop action ran and succeeded.
	pub stopped: usize,
	/// Handles that were already stopped.
	pub already_stopped: usize,
	/// One entry per handle that could not be stopped.
	pub failures: Vec<StopFailure>,
}

impl StopAllReport {
	pub fn is_clean(&self) -> bool {
		self.failures.is_empty()
	}
}

/// A single failed stop during [`ServerRegistry::stop_all`].
#[derive(Debug)]
pub struct StopFailure {
	pub key: InstanceKey,
	pub error: RegistryError,
}

#[derive(Default)]
struct RegistryState {
	servers: HashMap<InstanceKey, Arc<ServerHandle>>,
	/// Keys whose runner call is in flight.
	starting: HashSet<InstanceKey>,
	/// Set by the first `stop_all`; no handle is inserted afterwards.
	draining: bool,
}

/// Owns every server instance the host has started.
///
/// Shared as `Arc<ServerRegistry>` between the console, the status monitor,
/// the boot sequence and the shutdown path.
pub struct ServerRegistry {
	runners: RunnerSet,
	settings: ServeSettings,
	config: RegistryConfig,
	state: Mutex<RegistryState>,
}

impl ServerRegistry {
	pub fn new(runners: RunnerSet, settings: ServeSettings, config: RegistryConfig) -> Self {
		Self {
			runners,
			settings,
			config,
			state: Mutex::new(RegistryState::default()),
		}
	}

	pub fn runners(&self) -> &RunnerSet {
		&self.runners
	}

	/// Starts a server for `(kind, address)`.
	///
	/// A stopped entry for the key is replaced by a fresh runner invocation.
	/// Returns the new handle once the runner has bound its listener.
	///
	/// # Errors
	///
	/// - [`RegistryError::UnsupportedKind`] if no runner is registered for `kind`.
	/// - [`RegistryError::AlreadyRunning`] if the key has a running handle.
	/// - [`RegistryError::StartInProgress`] if another start for the key is in flight.
	/// - [`RegistryError::StartFailed`] or [`RegistryError::Timeout`] if the runner
	///   fails or hangs. The key is absent afterwards.
	/// - [`RegistryError::ShuttingDown`] once [`Self::stop_all`] has begun. A
	///   server whose runner returns after that point is torn down again
	///   instead of being registered.
	pub async fn start(&self, kind: impl Into<ServerKind>, address: &str) -> Result<Arc<ServerHandle>> {
		let key = InstanceKey::new(kind.into(), address);
		let Some(runner) = self.runners.get(key.kind()) else {
			return Err(RegistryError::UnsupportedKind(key.kind().clone()));
		};

		let reservation = self.reserve(&key)?;

		let started = match self.config.start_timeout {
			Some(after) => tokio::time::timeout(after, runner.start(key.address(), &self.settings))
				.await
				.map_err(|_| RegistryError::Timeout {
					key: key.clone(),
					op: Operation::Start,
					after,
				})?,
			None => runner.start(key.address(), &self.settings).await,
		}
		.map_err(|source| RegistryError::StartFailed { key: key.clone(), source })?;

		let handle = match reservation.commit(started) {
			Ok(handle) => handle,
			Err(started) => {
				self.discard(&key, started).await;
				return Err(RegistryError::ShuttingDown(key));
			}
		};

		info!(kind = %key.kind(), address = key.address(), local_addr = %handle.local_addr(), "server started");
		Ok(handle)
	}

	/// Tears down a server that finished binding after the shutdown sweep.
	///
	/// If this future is dropped midway the stop action is dropped with it,
	/// which cancels the built-in runners' serve tasks.
	async fn discard(&self, key: &InstanceKey, started: Started) {
		let mut stop = started.stop;
		let result = match self.config.stop_timeout {
			Some(after) => tokio::time::timeout(after, stop.stop()).await.map_err(|_| RegistryError::Timeout {
				key: key.clone(),
				op: Operation::Stop,
				after,
			}),
			None => Ok(stop.stop().await),
		};
		match result {
			Ok(Ok(())) => info!(kind = %key.kind(), address = key.address(), "late server stopped during shutdown"),
			Ok(Err(source)) => {
				let error = RegistryError::StopFailed { key: key.clone(), source };
				warn!(kind = %key.kind(), address = key.address(), %error, "failed to stop late server");
			}
			Err(error) => warn!(kind = %key.kind(), address = key.address(), %error, "failed to stop late server"),
		}
	}

	/// Checks the key and marks it as starting in one critical section.
	fn reserve<'a>(&'a self, key: &'a InstanceKey) -> Result<StartReservation<'a>> {
		let mut state = self.state.lock();
		if state.draining {
			return Err(RegistryError::ShuttingDown(key.clone()));
		}
		if state.starting.contains(key) {
			return Err(RegistryError::StartInProgress(key.clone()));
		}
		if let Some(existing) = state.servers.get(key) {
			if existing.status() == ServerStatus::Running {
				return Err(RegistryError::AlreadyRunning(key.clone()));
			}
			state.servers.remove(key);
			debug!(%key, "removed stopped server before restart");
		}
		state.starting.insert(key.clone());

		Ok(StartReservation {
			state: &self.state,
			key,
			armed: true,
		})
	}

	/// Stops the server for `(kind, address)`.
	///
	/// Stopping a stopped server succeeds without doing any work.
	///
	/// # Errors
	///
	/// - [`RegistryError::NotFound`] if the key has no entry.
	/// - [`RegistryError::StopFailed`] or [`RegistryError::Timeout`] if teardown
	///   fails or hangs. The handle stays `running`.
	pub async fn stop(&self, kind: impl Into<ServerKind>, address: &str) -> Result<()> {
		let key = InstanceKey::new(kind.into(), address);
		let handle = self.lookup(&key).ok_or_else(|| RegistryError::NotFound(key.clone()))?;

		match handle.stop(self.config.stop_timeout).await? {
			StopOutcome::Stopped => info!(kind = %key.kind(), address = key.address(), "server stopped"),
			StopOutcome::AlreadyStopped => debug!(%key, "server already stopped"),
		}
		Ok(())
	}

	/// Snapshot of every entry, sorted by address, kind and status.
	pub fn list(&self) -> Vec<ServerSnapshot> {
		let mut rows: Vec<_> = {
			let state = self.state.lock();
			state.servers.values().map(|handle| handle.snapshot()).collect()
		};
		rows.sort();
		rows
	}

	/// Stops every server concurrently and closes the registry to new starts.
	///
	/// Never fails as a whole: each failure is logged and collected in the
	/// report, and the remaining handles are still attempted. Starts still
	/// binding when the sweep begins tear their server down themselves and
	/// report [`RegistryError::ShuttingDown`].
	pub async fn stop_all(&self) -> StopAllReport {
		let handles: Vec<_> = {
			let mut state = self.state.lock();
			state.draining = true;
			state.servers.values().cloned().collect()
		};
		let deadline = self.config.stop_timeout;

		let mut tasks = JoinSet::new();
		let mut keys = HashMap::with_capacity(handles.len());
		for handle in handles {
			let key = handle.key().clone();
			let task = tasks.spawn(async move { handle.stop(deadline).await });
			keys.insert(task.id(), key);
		}

		let mut report = StopAllReport::default();
		while let Some(joined) = tasks.join_next_with_id().await {
			let (id, result) = match joined {
				Ok(done) => done,
				Err(join_error) => {
					let id = join_error.id();
					let Some(key) = keys.get(&id).cloned() else {
						continue;
					};
					let source = RunnerError::Teardown(join_error.to_string());
					(id, Err(RegistryError::StopFailed { key, source }))
				}
			};
			let Some(key) = keys.remove(&id) else {
				continue;
			};

			match result {
				Ok(StopOutcome::Stopped) => {
					info!(kind = %key.kind(), address = key.address(), "server stopped");
					report.stopped += 1;
				}
				Ok(StopOutcome::AlreadyStopped) => report.already_stopped += 1,
				Err(error) => {
					warn!(kind = %key.kind(), address = key.address(), %error, "failed to stop server");
					report.failures.push(StopFailure { key, error });
				}
			}
		}

		report
	}

	pub fn len(&self) -> usize {
		self.state.lock().servers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.state.lock().servers.is_empty()
	}

	pub fn contains(&self, kind: impl Into<ServerKind>, address: &str) -> bool {
		let key = InstanceKey::new(kind.into(), address);
		self.state.lock().servers.contains_key(&key)
	}

	/// Current status of `(kind, address)`, if it has an entry.
	pub fn status(&self, kind: impl Into<ServerKind>, address: &str) -> Option<ServerStatus> {
		let key = InstanceKey::new(kind.into(), address);
		self.lookup(&key).map(|handle| handle.status())
	}

	fn lookup(&self, key: &InstanceKey) -> Option<Arc<ServerHandle>> {
		self.state.lock().servers.get(key).cloned()
	}
}

impl std::fmt::Debug for ServerRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ServerRegistry")
			.field("runners", &self.runners)
			.field("settings", &self.settings)
			.field("config", &self.config)
			.field("servers", &self.len())
			.finish()
	}
}

/// Marks a key as starting for the duration of one runner call.
///
/// Dropping the guard without committing (runner error, timeout, or the start
/// future being cancelled) releases the key.
struct StartReservation<'a> {
	state: &'a Mutex<RegistryState>,
	key: &'a InstanceKey,
	armed: bool,
}

impl StartReservation<'_> {
	/// Swaps the reservation for a running handle in one critical section.
	///
	/// Hands `started` back if a shutdown sweep began while the runner was
	/// binding; the caller must tear it down.
	fn commit(mut self, started: Started) -> Result<Arc<ServerHandle>, Started> {
		let mut state = self.state.lock();
		state.starting.remove(self.key);
		self.armed = false;
		if state.draining {
			return Err(started);
		}
		let handle = Arc::new(ServerHandle::running(self.key.clone(), started));
		state.servers.insert(self.key.clone(), Arc::clone(&handle));
		Ok(handle)
	}
}

impl Drop for StartReservation<'_> {
	fn drop(&mut self) {
		if self.armed {
			self.state.lock().starting.remove(self.key);
		}
	}
}
