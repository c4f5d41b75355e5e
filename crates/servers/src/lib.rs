//! Built-in runners for the downstream server registry.
//!
//! Each runner binds its listener before returning, then serves on a spawned
//! task controlled by a [`ServeControl`]. Serve tasks log under their module's
//! tracing target (`downstream_servers::http`, `downstream_servers::grpc`,
//! `downstream_servers::tcp`) so the host can route each protocol to its own
//! log file.

mod addr;
mod control;
pub mod grpc;
pub mod http;
pub mod tcp;

pub use addr::resolve;
pub use control::ServeControl;
use downstream_registry::{RunnerSet, ServerKind};
pub use grpc::GrpcRunner;
pub use http::HttpRunner;
pub use tcp::TcpRunner;

/// Runner set with HTTP, gRPC and TCP registered under their standard kinds.
pub fn default_runners() -> RunnerSet {
	RunnerSet::new()
		.with(ServerKind::HTTP, HttpRunner)
		.with(ServerKind::GRPC, GrpcRunner)
		.with(ServerKind::TCP, TcpRunner)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_runners_cover_the_builtin_kinds() {
		assert_eq!(default_runners().kinds(), vec![ServerKind::GRPC, ServerKind::HTTP, ServerKind::TCP]);
	}
}
