//! Boot, console loop, signal handling and the single shutdown path.

use std::io::BufRead;
use std::sync::Arc;

use anyhow::Context;
use downstream_config::Config;
use downstream_console::{Command, Monitor, Outcome, Output, dispatch};
use downstream_registry::{ServerKind, ServerRegistry, StopAllReport};
use downstream_servers::default_runners;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cli::Cli;
use crate::logging;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
	let config = Config::load(&cli.config).with_context(|| format!("failed to load config {}", cli.config.display()))?;
	let cwd = std::env::current_dir().context("failed to read current directory")?;
	let log_dir = match &cli.log_dir {
		Some(dir) => cwd.join(dir),
		None => config.log_dir(&cwd),
	};
	let log_files = logging::init(&config.log, config.log.file_writer_on.then_some(log_dir.as_path()), cli.verbose)?;
	info!(config = %cli.config.display(), ?log_files, "starting downstream host");

	let registry = Arc::new(ServerRegistry::new(
		default_runners(),
		config.serve_settings(),
		config.registry_config(),
	));
	let output = Output::stdout().clear_screen(!cli.no_monitor);
	let shutdown = CancellationToken::new();

	// Uptime is counted from here, before the boot targets are started.
	let monitor = (!cli.no_monitor).then(|| Monitor::new(Arc::clone(&registry), output.clone()));

	boot(&registry, &config.boot_targets(), &output).await;

	let mut tasks = JoinSet::new();
	if let Some(monitor) = monitor {
		tasks.spawn(monitor.run(shutdown.clone()));
	}
	tasks.spawn(console_loop(Arc::clone(&registry), output.clone(), stdin_lines(), shutdown.clone()));
	tasks.spawn(cancel_on_signal(shutdown.clone()));

	shutdown.cancelled().await;
	tasks.abort_all();

	let report = shut_down(&registry, &output).await;
	if !report.is_clean() {
		warn!(failures = report.failures.len(), "some servers did not stop cleanly");
	}
	Ok(())
}

/// Starts every configured server, logging failures and moving on.
pub async fn boot(registry: &ServerRegistry, targets: &[(ServerKind, String)], output: &Output) {
	for (kind, address) in targets {
		if let Err(error) = registry.start(kind.clone(), address).await {
			error!(%kind, address, %error, "failed to start configured server");
			say(output, &format!("Failed to start {kind} server on {address}: {error}"));
		}
	}
}

/// Reads console lines until `exit`, end of input, or shutdown.
///
/// `exit` and end of input both cancel `shutdown`.
pub async fn console_loop(
	registry: Arc<ServerRegistry>,
	output: Output,
	mut lines: mpsc::Receiver<String>,
	shutdown: CancellationToken,
) {
	loop {
		let line = tokio::select! {
			biased;
			_ = shutdown.cancelled() => return,
			line = lines.recv() => line,
		};
		let Some(line) = line else {
			info!("console input closed");
			shutdown.cancel();
			return;
		};

		match Command::parse(&line) {
			Ok(None) => {}
			Ok(Some(command)) => match dispatch(&registry, command).await {
				Outcome::Reply(text) => say(&output, &text),
				Outcome::Exit => {
					info!("exit requested from console");
					shutdown.cancel();
					return;
				}
			},
			Err(error) => say(&output, &error.to_string()),
		}
	}
}

/// Stops every server and prints the farewell. Callers run this once.
pub async fn shut_down(registry: &ServerRegistry, output: &Output) -> StopAllReport {
	say(output, "\nShutting down all servers...");
	let report = registry.stop_all().await;
	for failure in &report.failures {
		say(output, &format!("Error: {}", failure.error));
	}
	info!(stopped = report.stopped, failed = report.failures.len(), "registry drained");
	if let Err(error) = output.close("All servers stopped. Exiting...") {
		warn!(%error, "console write failed");
	}
	report
}

/// Forwards stdin lines from a plain thread.
///
/// Blocking stdin reads would otherwise hold up runtime shutdown, so the
/// reader lives outside the runtime and is simply abandoned at exit.
fn stdin_lines() -> mpsc::Receiver<String> {
	let (tx, rx) = mpsc::channel(16);
	let spawned = std::thread::Builder::new().name("console-stdin".into()).spawn(move || {
		for line in std::io::stdin().lock().lines() {
			let Ok(line) = line else {
				break;
			};
			if tx.blocking_send(line).is_err() {
				break;
			}
		}
	});
	if let Err(error) = spawned {
		error!(%error, "failed to spawn console reader, console input disabled");
	}
	rx
}

async fn cancel_on_signal(shutdown: CancellationToken) {
	match wait_for_signal().await {
		Ok(signal) => info!(signal, "shutdown signal received"),
		Err(error) => {
			warn!(%error, "signal handling unavailable");
			return;
		}
	}
	shutdown.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
	use tokio::signal::unix::{SignalKind, signal};

	let mut terminate = signal(SignalKind::terminate())?;
	tokio::select! {
		interrupted = tokio::signal::ctrl_c() => interrupted.map(|()| "SIGINT"),
		_ = terminate.recv() => Ok("SIGTERM"),
	}
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
	tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
}

fn say(output: &Output, text: &str) {
	if let Err(error) = output.line(text) {
		warn!(%error, "console write failed");
	}
}
