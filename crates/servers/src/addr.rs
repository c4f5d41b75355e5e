//! Address resolution shared by every runner.

use std::net::{Ipv4Addr, SocketAddr};

use downstream_registry::RunnerError;
use tokio::net::{TcpListener, lookup_host};

/// Resolves a user-supplied address to one socket address.
///
/// A bare port (`9001`) or a leading-colon port (`:9001`) binds all IPv4
/// interfaces. Anything else must be `host:port`; the first resolved address
/// wins.
pub async fn resolve(address: &str) -> Result<SocketAddr, RunnerError> {
	let trimmed = address.trim();
	if trimmed.is_empty() {
		return Err(invalid(address, "empty address"));
	}

	let port = trimmed.strip_prefix(':').unwrap_or(trimmed);
	if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) {
		let port: u16 = port.parse().map_err(|_| invalid(address, "port out of range"))?;
		return Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));
	}

	lookup_host(trimmed)
		.await
		.map_err(|error| invalid(address, error.to_string()))?
		.next()
		.ok_or_else(|| invalid(address, "host resolved to no addresses"))
}

/// Resolves and binds a TCP listener.
pub(crate) async fn bind(address: &str) -> Result<TcpListener, RunnerError> {
	let addr = resolve(address).await?;
	TcpListener::bind(addr).await.map_err(|source| RunnerError::Bind {
		address: addr.to_string(),
		source,
	})
}

fn invalid(address: &str, reason: impl Into<String>) -> RunnerError {
	RunnerError::InvalidAddress {
		address: address.to_owned(),
		reason: reason.into(),
	}
}
