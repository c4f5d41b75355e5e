//! Stop action shared by the built-in runners.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use downstream_registry::{RunnerError, StopServer};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Cancellation token plus the serve task it controls.
///
/// The serve future receives the token and must return once it is cancelled,
/// after draining whatever it can. `stop` waits up to the grace period for
/// that and aborts the task otherwise.
#[derive(Debug)]
pub struct ServeControl {
	cancel: CancellationToken,
	task: Option<JoinHandle<()>>,
	grace: Duration,
}

impl ServeControl {
	/// Spawns `serve` on the current runtime.
	pub fn spawn<F, Fut>(grace: Duration, serve: F) -> Self
	where
		F: FnOnce(CancellationToken) -> Fut,
		Fut: Future<Output = ()> + Send + 'static,
	{
		let cancel = CancellationToken::new();
		let task = tokio::spawn(serve(cancel.clone()));
		Self {
			cancel,
			task: Some(task),
			grace,
		}
	}

	/// Whether the serve task has exited, for whatever reason.
	pub fn is_finished(&self) -> bool {
		self.task.as_ref().is_none_or(JoinHandle::is_finished)
	}
}

#[async_trait]
impl StopServer for ServeControl {
	async fn stop(&mut self) -> Result<(), RunnerError> {
		self.cancel.cancel();
		let Some(mut task) = self.task.take() else {
			return Ok(());
		};

		match tokio::time::timeout(self.grace, &mut task).await {
			Ok(Ok(())) => Ok(()),
			Ok(Err(error)) if error.is_panic() => Err(RunnerError::Teardown(format!("serve task panicked: {error}"))),
			Ok(Err(_)) => Ok(()),
			Err(_) => {
				warn!(grace = ?self.grace, "serve task did not drain in time, aborting");
				task.abort();
				let _ = task.await;
				Ok(())
			}
		}
	}
}

impl Drop for ServeControl {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}
