use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, TimeZone};
use clap::Parser;
use downstream_config::LogConfig;
use downstream_console::Output;
use downstream_registry::{RegistryConfig, ServeSettings, ServerKind, ServerRegistry, ServerStatus};
use downstream_servers::default_runners;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::app::{boot, console_loop, shut_down};
use crate::cli::Cli;
use crate::logging::{LogFiles, combined_log_name, default_directive, protocol_log_name};

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
	fn text(&self) -> String {
		String::from_utf8_lossy(&self.0.lock()).into_owned()
	}
}

impl Write for Capture {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

fn registry() -> Arc<ServerRegistry> {
	Arc::new(ServerRegistry::new(
		default_runners(),
		ServeSettings::default(),
		RegistryConfig::default(),
	))
}

fn quiet_output() -> (Output, Capture) {
	let capture = Capture::default();
	(Output::new(capture.clone()).clear_screen(false), capture)
}

#[test]
fn cli_defaults() {
	let cli = Cli::try_parse_from(["downstream"]).unwrap();

	assert_eq!(cli.config, Path::new("./config.yaml"));
	assert!(!cli.verbose);
	assert!(!cli.no_monitor);
	assert!(cli.log_dir.is_none());
}

#[test]
fn cli_flags() {
	let cli = Cli::try_parse_from(["downstream", "-c", "/etc/ds.yaml", "-v", "--no-monitor", "--log-dir", "/tmp/ds"]).unwrap();

	assert_eq!(cli.config, Path::new("/etc/ds.yaml"));
	assert!(cli.verbose);
	assert!(cli.no_monitor);
	assert_eq!(cli.log_dir.as_deref(), Some(Path::new("/tmp/ds")));
}

#[test]
fn log_file_names() {
	let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

	assert_eq!(protocol_log_name("grpc", now), "grpc_server_20240309_140507.log");
	assert_eq!(combined_log_name(4242), "downstream.4242.log");
}

#[test]
fn log_files_are_created_in_the_directory() {
	let dir = tempfile::tempdir().unwrap();
	let nested = dir.path().join("logs");
	let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

	let files = LogFiles::create(&nested, 7, now).unwrap();

	let names: Vec<_> = files
		.paths()
		.iter()
		.map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
		.collect();
	assert_eq!(
		names,
		[
			"downstream.7.log",
			"http_server_20240309_140507.log",
			"grpc_server_20240309_140507.log",
			"tcp_server_20240309_140507.log",
		]
	);
	assert!(files.paths().iter().all(|p| p.is_file()));
}

#[test]
fn verbose_overrides_configured_level() {
	let log = LogConfig {
		log_level: "warn".into(),
		..LogConfig::default()
	};

	assert!(default_directive(&log, false).starts_with("warn,"));
	assert!(default_directive(&log, true).starts_with("debug,"));
}

#[tokio::test]
async fn boot_continues_past_failed_targets() {
	let registry = registry();
	let (output, capture) = quiet_output();
	let targets = [
		(ServerKind::TCP, "127.0.0.1:0".to_owned()),
		(ServerKind::TCP, "not an address".to_owned()),
		(ServerKind::HTTP, "127.0.0.1:0".to_owned()),
	];

	boot(&registry, &targets, &output).await;

	assert_eq!(registry.len(), 2);
	assert_eq!(registry.status("http", "127.0.0.1:0"), Some(ServerStatus::Running));
	assert!(capture.text().contains("Failed to start tcp server on not an address"));
	registry.stop_all().await;
}

#[tokio::test]
async fn console_exit_cancels_shutdown_once() {
	let registry = registry();
	let (output, capture) = quiet_output();
	let (tx, rx) = mpsc::channel(8);
	let shutdown = CancellationToken::new();
	let console = tokio::spawn(console_loop(Arc::clone(&registry), output, rx, shutdown.clone()));

	for line in ["start tcp 127.0.0.1:0", "", "bogus", "start tcp", "exit", "stop tcp 127.0.0.1:0"] {
		tx.try_send(line.to_owned()).unwrap();
	}
	tokio::time::timeout(Duration::from_secs(5), console).await.unwrap().unwrap();

	assert!(shutdown.is_cancelled());
	let text = capture.text();
	assert!(text.contains("started tcp:127.0.0.1:0"));
	assert!(text.contains("Unknown command. Available: start, stop, list, exit"));
	assert!(text.contains("Usage: start <type> <address>"));
	// Nothing after `exit` is executed.
	assert_eq!(registry.status("tcp", "127.0.0.1:0"), Some(ServerStatus::Running));
	registry.stop_all().await;
}

#[tokio::test]
async fn end_of_input_triggers_shutdown() {
	let (output, _capture) = quiet_output();
	let (tx, rx) = mpsc::channel(1);
	let shutdown = CancellationToken::new();
	drop(tx);

	console_loop(registry(), output, rx, shutdown.clone()).await;

	assert!(shutdown.is_cancelled());
}

#[tokio::test]
async fn shut_down_stops_everything_and_says_goodbye() {
	let registry = registry();
	registry.start("tcp", "127.0.0.1:0").await.unwrap();
	registry.start("grpc", "127.0.0.1:0").await.unwrap();
	let (output, capture) = quiet_output();

	let report = shut_down(&registry, &output).await;

	assert_eq!(report.stopped, 2);
	assert!(registry.list().iter().all(|row| row.status == ServerStatus::Stopped));
	assert!(capture.text().ends_with("All servers stopped. Exiting...\n"));
}
