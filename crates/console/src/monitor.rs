//! Periodic status redraw.

use std::sync::Arc;
use std::time::Duration;

use downstream_registry::ServerRegistry;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::output::Output;
use crate::table::render_table;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Redraws the status table on a fixed interval until cancelled.
///
/// Uptime is measured from construction, so build the monitor when the host
/// starts rather than when the task is spawned.
#[derive(Debug)]
pub struct Monitor {
	registry: Arc<ServerRegistry>,
	output: Output,
	interval: Duration,
	started: Instant,
}

impl Monitor {
	pub fn new(registry: Arc<ServerRegistry>, output: Output) -> Self {
		Self {
			registry,
			output,
			interval: DEFAULT_INTERVAL,
			started: Instant::now(),
		}
	}

	#[must_use]
	pub fn interval(mut self, interval: Duration) -> Self {
		self.interval = interval;
		self
	}

	pub async fn run(self, cancel: CancellationToken) {
		let mut ticker = tokio::time::interval(self.interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				biased;
				_ = cancel.cancelled() => break,
				_ = ticker.tick() => {
					let screen = render_table(&self.registry.list(), self.started.elapsed());
					if let Err(error) = self.output.redraw(&screen) {
						warn!(%error, "status redraw failed, stopping monitor");
						break;
					}
				}
			}
		}
	}
}
