//! Runner capability: the protocol-specific half of a server's lifecycle.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{RunnerError, ServerKind};

/// Shared settings handed to every runner on start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeSettings {
	/// Number of responses a gRPC server-streaming call fans out.
	pub stream_fanout: u32,
	/// Per-request deadline for HTTP handlers.
	pub http_write_timeout: Duration,
	/// How long a stopping server may drain in-flight connections before its
	/// serve task is aborted.
	pub shutdown_grace: Duration,
}

impl Default for ServeSettings {
	fn default() -> Self {
		Self {
			stream_fanout: 10,
			http_write_timeout: Duration::from_secs(3),
			shutdown_grace: Duration::from_secs(5),
		}
	}
}

/// Trait for starting one protocol's servers.
///
/// Production runners bind real sockets; tests register in-process fakes.
///
/// A runner must return only once the listener is bound and serving has been
/// launched in the background, so the caller is never blocked by the serve
/// loop itself.
#[async_trait]
pub trait Runner: Send + Sync + 'static {
	/// Binds `address` and starts serving in the background.
	async fn start(&self, address: &str, settings: &ServeSettings) -> Result<Started, RunnerError>;
}

/// Stop action for one started server.
///
/// Owned exclusively by the registry's handle. The handle drops it after the
/// first successful call, so it is never invoked again once teardown
/// succeeded. A failed call leaves it in place for a retry.
#[async_trait]
pub trait StopServer: Send + 'static {
	/// Tears the server down.
	///
	/// Must return `Ok` (and must not hang or panic) when the serve loop has
	/// already exited on its own. Errors only if teardown itself failed.
	async fn stop(&mut self) -> Result<(), RunnerError>;
}

/// A server that has bound its listener and is serving.
pub struct Started {
	/// Address the listener actually bound (resolves port `0`).
	pub local_addr: SocketAddr,
	/// Stop action for the server.
	pub stop: Box<dyn StopServer>,
}

impl Started {
	pub fn new(local_addr: SocketAddr, stop: impl StopServer) -> Self {
		Self {
			local_addr,
			stop: Box::new(stop),
		}
	}
}

impl fmt::Debug for Started {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Started").field("local_addr", &self.local_addr).finish_non_exhaustive()
	}
}

/// Strategy map from [`ServerKind`] to the runner that starts it.
#[derive(Clone, Default)]
pub struct RunnerSet {
	runners: HashMap<ServerKind, Arc<dyn Runner>>,
}

impl RunnerSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `runner` for `kind`, replacing any previous runner.
	pub fn register(&mut self, kind: ServerKind, runner: Arc<dyn Runner>) -> &mut Self {
		self.runners.insert(kind, runner);
		self
	}

	/// Builder-style [`Self::register`].
	#[must_use]
	pub fn with(mut self, kind: ServerKind, runner: impl Runner) -> Self {
		self.runners.insert(kind, Arc::new(runner));
		self
	}

	pub fn get(&self, kind: &ServerKind) -> Option<Arc<dyn Runner>> {
		self.runners.get(kind).cloned()
	}

	/// Registered kinds, sorted by name.
	pub fn kinds(&self) -> Vec<ServerKind> {
		let mut kinds: Vec<_> = self.runners.keys().cloned().collect();
		kinds.sort();
		kinds
	}
}

impl fmt::Debug for RunnerSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RunnerSet").field("kinds", &self.kinds()).finish()
	}
}
