//! Error types for configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading the configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The document is not valid YAML or does not match the schema.
	#[error("YAML parse error: {0}")]
	Yaml(#[from] serde_yaml::Error),

	/// A value parsed but is not usable.
	#[error("invalid {field}: {reason}")]
	Invalid {
		/// Dotted path of the offending field, e.g. `grpc.ports`.
		field: &'static str,
		/// What is wrong with it.
		reason: String,
	},
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
