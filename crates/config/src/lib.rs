//! Configuration for the downstream server host.
//!
//! Configuration is a YAML document, `./config.yaml` by default. Every
//! section is optional:
//!
//! ```yaml
//! base:
//!   debug_mode: debug
//!   time_location: Asia/Shanghai
//! http:
//!   addrs: ["127.0.0.1:2003", ":2004"]
//!   write_timeout_ms: 3000
//! grpc:
//!   streamingCount: 10
//!   ports: [50055]
//! tcp:
//!   ports: [7002]
//! log:
//!   log_level: info
//!   file_writer_on: true
//!   log_path: ./logs
//!   console_writer: false
//!   color: true
//! registry:
//!   start_timeout_ms: 10000
//!   stop_timeout_ms: 15000
//!   shutdown_grace_ms: 5000
//! ```
//!
//! The host only consumes the result through [`Config::boot_targets`],
//! [`Config::serve_settings`], [`Config::registry_config`] and the `log`
//! section.

pub mod error;

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use downstream_registry::{RegistryConfig, ServeSettings, ServerKind};
pub use error::{ConfigError, Result};
use serde::Deserialize;

#[cfg(test)]
mod tests;

/// Parsed host configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
	pub base: BaseConfig,
	pub http: HttpConfig,
	pub grpc: GrpcConfig,
	pub tcp: TcpConfig,
	pub log: LogConfig,
	pub registry: RegistrySection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BaseConfig {
	pub debug_mode: String,
	pub time_location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
	/// Listen addresses, `host:port` or a bare port.
	pub addrs: Vec<String>,
	/// Per-request deadline for HTTP handlers.
	pub write_timeout_ms: u64,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			addrs: Vec::new(),
			write_timeout_ms: 3_000,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GrpcConfig {
	/// Responses per `ServerStreamingEcho` call.
	#[serde(alias = "streamingCount")]
	pub streaming_count: u32,
	pub ports: Vec<u16>,
}

impl Default for GrpcConfig {
	fn default() -> Self {
		Self {
			streaming_count: 10,
			ports: Vec::new(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TcpConfig {
	pub ports: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
	/// Default filter directive, overridden by `RUST_LOG`.
	pub log_level: String,
	/// Write log files into `log_path`.
	pub file_writer_on: bool,
	pub log_path: PathBuf,
	/// Mirror logs to stderr.
	pub console_writer: bool,
	/// ANSI colors on the stderr writer.
	pub color: bool,
}

impl Default for LogConfig {
	fn default() -> Self {
		Self {
			log_level: "info".to_owned(),
			file_writer_on: true,
			log_path: PathBuf::from("./logs"),
			console_writer: false,
			color: true,
		}
	}
}

/// Deadlines for registry operations. A `null` timeout is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistrySection {
	pub start_timeout_ms: Option<u64>,
	pub stop_timeout_ms: Option<u64>,
	pub shutdown_grace_ms: u64,
}

impl Default for RegistrySection {
	fn default() -> Self {
		Self {
			start_timeout_ms: Some(10_000),
			stop_timeout_ms: Some(15_000),
			shutdown_grace_ms: 5_000,
		}
	}
}

impl Config {
	/// Parse and validate a YAML string.
	///
	/// An empty document yields the defaults.
	pub fn parse(input: &str) -> Result<Self> {
		let config = serde_yaml::from_str::<Option<Self>>(input)?.unwrap_or_default();
		config.validate()?;
		Ok(config)
	}

	/// Load configuration from a file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		Self::parse(&content)
	}

	fn validate(&self) -> Result<()> {
		if self.grpc.streaming_count == 0 {
			return Err(invalid("grpc.streaming_count", "must be at least 1"));
		}
		if self.http.write_timeout_ms == 0 {
			return Err(invalid("http.write_timeout_ms", "must be at least 1"));
		}
		if self.registry.start_timeout_ms == Some(0) {
			return Err(invalid("registry.start_timeout_ms", "must be at least 1, or null for no deadline"));
		}
		if self.registry.stop_timeout_ms == Some(0) {
			return Err(invalid("registry.stop_timeout_ms", "must be at least 1, or null for no deadline"));
		}
		if self.registry.shutdown_grace_ms == 0 {
			return Err(invalid("registry.shutdown_grace_ms", "must be at least 1"));
		}
		if let Some(i) = self.http.addrs.iter().position(|addr| addr.trim().is_empty()) {
			return Err(invalid("http.addrs", format!("entry {} is empty", i + 1)));
		}
		if self.grpc.ports.contains(&0) {
			return Err(invalid("grpc.ports", "port 0 is not a fixed port"));
		}
		if self.tcp.ports.contains(&0) {
			return Err(invalid("tcp.ports", "port 0 is not a fixed port"));
		}
		Ok(())
	}

	/// Servers to start at launch, gRPC first, then HTTP, then TCP.
	pub fn boot_targets(&self) -> Vec<(ServerKind, String)> {
		let grpc = self.grpc.ports.iter().map(|port| (ServerKind::GRPC, port.to_string()));
		let http = self.http.addrs.iter().map(|addr| (ServerKind::HTTP, addr.trim().to_owned()));
		let tcp = self.tcp.ports.iter().map(|port| (ServerKind::TCP, port.to_string()));
		grpc.chain(http).chain(tcp).collect()
	}

	pub fn serve_settings(&self) -> ServeSettings {
		ServeSettings {
			stream_fanout: self.grpc.streaming_count,
			http_write_timeout: Duration::from_millis(self.http.write_timeout_ms),
			shutdown_grace: Duration::from_millis(self.registry.shutdown_grace_ms),
		}
	}

	pub fn registry_config(&self) -> RegistryConfig {
		RegistryConfig {
			start_timeout: self.registry.start_timeout_ms.map(Duration::from_millis),
			stop_timeout: self.registry.stop_timeout_ms.map(Duration::from_millis),
		}
	}

	/// `log.log_path`, made absolute against `base_dir` when relative.
	pub fn log_dir(&self, base_dir: &Path) -> PathBuf {
		if self.log.log_path.is_absolute() {
			self.log.log_path.clone()
		} else {
			let relative: PathBuf = self.log.log_path.components().filter(|c| !matches!(c, Component::CurDir)).collect();
			base_dir.join(relative)
		}
	}
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
	ConfigError::Invalid {
		field,
		reason: reason.into(),
	}
}
