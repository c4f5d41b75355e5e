use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

/// Protocol name a runner is registered under.
///
/// Kinds are open: the three built-in protocols are provided as constants, and
/// any other name becomes usable as soon as a runner is registered for it.
/// Names are trimmed and lowercased so `HTTP` and `http` address the same
/// runner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ServerKind(Cow<'static, str>);

impl ServerKind {
	/// Plain HTTP/1.1 server.
	pub const HTTP: Self = Self(Cow::Borrowed("http"));
	/// gRPC server.
	pub const GRPC: Self = Self(Cow::Borrowed("grpc"));
	/// Raw TCP server.
	pub const TCP: Self = Self(Cow::Borrowed("tcp"));

	/// Normalizes a user-supplied protocol name.
	pub fn new(name: impl AsRef<str>) -> Self {
		let name = name.as_ref().trim();
		match name.to_ascii_lowercase().as_str() {
			"http" => Self::HTTP,
			"grpc" => Self::GRPC,
			"tcp" => Self::TCP,
			other => Self(Cow::Owned(other.to_owned())),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ServerKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(&self.0)
	}
}

impl From<&str> for ServerKind {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

/// Identity of one server instance: `(kind, address)`.
///
/// Displays as `<kind>:<address>`, which is also how errors and logs refer to
/// an instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceKey {
	kind: ServerKind,
	address: String,
}

impl InstanceKey {
	pub fn new(kind: ServerKind, address: impl Into<String>) -> Self {
		Self {
			kind,
			address: address.into().trim().to_owned(),
		}
	}

	pub fn kind(&self) -> &ServerKind {
		&self.kind
	}

	pub fn address(&self) -> &str {
		&self.address
	}
}

impl fmt::Display for InstanceKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.kind, self.address)
	}
}
