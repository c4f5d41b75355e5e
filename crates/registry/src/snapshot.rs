use std::cmp::Ordering;

use serde::Serialize;

use crate::{ServerKind, ServerStatus};

/// Read-only copy of one handle's state, taken for display.
///
/// Carries no stop action, so holding a snapshot grants no control over the
/// instance it describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ServerSnapshot {
	pub kind: ServerKind,
	pub address: String,
	pub status: ServerStatus,
}

impl ServerSnapshot {
	pub fn new(kind: ServerKind, address: impl Into<String>, status: ServerStatus) -> Self {
		Self {
			kind,
			address: address.into(),
			status,
		}
	}
}

/// Display order: address, then kind, then status.
impl Ord for ServerSnapshot {
	fn cmp(&self, other: &Self) -> Ordering {
		self.address
			.cmp(&other.address)
			.then_with(|| self.kind.cmp(&other.kind))
			.then_with(|| self.status.cmp(&other.status))
	}
}

impl PartialOrd for ServerSnapshot {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
