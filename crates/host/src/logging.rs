//! Tracing setup: optional stderr mirror, one combined log file, and one file
//! per protocol selected by tracing target.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local};
use downstream_config::LogConfig;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Protocol name and the tracing target its serve tasks log under.
pub const PROTOCOL_TARGETS: [(&str, &str); 3] = [
	("http", "downstream_servers::http"),
	("grpc", "downstream_servers::grpc"),
	("tcp", "downstream_servers::tcp"),
];

/// Noisy transport crates are capped unless `RUST_LOG` says otherwise.
const QUIET_DEPS: &str = "h2=warn,hyper=warn,hyper_util=warn,tower=warn,tonic=info";

/// Opened log files, in [`PROTOCOL_TARGETS`] order after the combined file.
#[derive(Debug)]
pub struct LogFiles {
	pub combined: (PathBuf, File),
	pub protocols: Vec<(&'static str, PathBuf, File)>,
}

impl LogFiles {
	/// Creates `dir` and opens `downstream.<pid>.log` plus
	/// `<protocol>_server_<timestamp>.log` for each protocol.
	pub fn create(dir: &Path, pid: u32, now: DateTime<Local>) -> anyhow::Result<Self> {
		std::fs::create_dir_all(dir).with_context(|| format!("failed to create log directory {}", dir.display()))?;

		let combined_path = dir.join(combined_log_name(pid));
		let combined = (combined_path.clone(), open_append(&combined_path)?);

		let mut protocols = Vec::with_capacity(PROTOCOL_TARGETS.len());
		for (protocol, target) in PROTOCOL_TARGETS {
			let path = dir.join(protocol_log_name(protocol, now));
			let file = open_append(&path)?;
			protocols.push((target, path, file));
		}

		Ok(Self { combined, protocols })
	}

	pub fn paths(&self) -> Vec<PathBuf> {
		std::iter::once(self.combined.0.clone())
			.chain(self.protocols.iter().map(|(_, path, _)| path.clone()))
			.collect()
	}
}

pub fn combined_log_name(pid: u32) -> String {
	format!("downstream.{pid}.log")
}

pub fn protocol_log_name(protocol: &str, now: DateTime<Local>) -> String {
	format!("{protocol}_server_{}.log", now.format("%Y%m%d_%H%M%S"))
}

fn open_append(path: &Path) -> anyhow::Result<File> {
	OpenOptions::new()
		.create(true)
		.append(true)
		.open(path)
		.with_context(|| format!("failed to open log file {}", path.display()))
}

/// Default filter directive when `RUST_LOG` is unset.
pub fn default_directive(log: &LogConfig, verbose: bool) -> String {
	let level = if verbose { "debug" } else { log.log_level.trim() };
	let level = if level.is_empty() { "info" } else { level };
	format!("{level},{QUIET_DEPS}")
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Installs the global subscriber. Returns the paths of the files it writes.
pub fn init(log: &LogConfig, log_dir: Option<&Path>, verbose: bool) -> anyhow::Result<Vec<PathBuf>> {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(default_directive(log, verbose)))
		.unwrap_or_else(|_| EnvFilter::new("info"));

	let mut layers: Vec<BoxedLayer> = Vec::new();
	if log.console_writer {
		layers.push(
			tracing_subscriber::fmt::layer()
				.with_writer(std::io::stderr)
				.with_ansi(log.color)
				.with_target(true)
				.boxed(),
		);
	}

	let mut paths = Vec::new();
	if let Some(dir) = log_dir {
		let files = LogFiles::create(dir, std::process::id(), Local::now())?;
		paths = files.paths();
		layers.push(file_layer(files.combined.1).boxed());
		for (target, _, file) in files.protocols {
			let only_protocol = Targets::new().with_target(target, LevelFilter::TRACE);
			layers.push(file_layer(file).with_filter(only_protocol).boxed());
		}
	}

	tracing_subscriber::registry()
		.with(layers)
		.with(filter)
		.try_init()
		.context("failed to install tracing subscriber")?;

	Ok(paths)
}

fn file_layer(file: File) -> impl Layer<Registry> + Send + Sync {
	tracing_subscriber::fmt::layer().with_writer(file).with_ansi(false).with_target(true)
}
