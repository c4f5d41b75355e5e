//! Lifecycle registry for runtime-managed downstream test servers.
//!
//! # Purpose
//!
//! - Track which `(kind, address)` server instances exist and whether each is running or stopped.
//! - Enforce exactly one running instance per key while Start, Stop, List and StopAll run concurrently.
//! - Provide a shutdown sweep that attempts every instance even when some fail to stop.
//! - Exclude protocol internals; see the `downstream-servers` crate for the HTTP, gRPC and TCP runners.
//!
//! # Mental model
//!
//! - A [`Runner`] knows how to bind one protocol at an address. Runners are looked up by [`ServerKind`] in a [`RunnerSet`]; the registry never branches on a specific kind.
//! - A successful runner call yields [`Started`]: the bound address plus a [`StopServer`] action. The registry wraps it in a [`ServerHandle`].
//! - Handles move `running -> stopped` only through Stop or StopAll. A restart deletes the stopped handle and invokes the runner again; nothing carries over.
//! - Callers observe state through [`ServerSnapshot`]s, which carry no stop action.
//!
//! # Key types
//!
//! | Type | Meaning | Constraints | Constructed / mutated in |
//! |---|---|---|---|
//! | [`ServerRegistry`] | Map from key to handle | MUST be the only owner of handles | `ServerRegistry::*` |
//! | [`InstanceKey`] | `(kind, address)` identity | MUST display as `<kind>:<address>` | `InstanceKey::new` |
//! | [`ServerHandle`] | One instance's record | Status MUST only become `stopped` after the stop action returned `Ok` | `ServerRegistry::start`, `ServerHandle::stop` |
//! | [`ServerSnapshot`] | Read-only row for display | MUST NOT expose the stop action | `ServerRegistry::list` |
//! | [`RunnerSet`] | Strategy map kind -> runner | Kinds are case-insensitive | `RunnerSet::register` |
//! | [`ServeSettings`] | Settings passed to every runner | Owned by the registry, never global | `ServerRegistry::new` |
//!
//! # Invariants
//!
//! 1. At most one handle per [`InstanceKey`] exists at any time.
//!    - Enforced in: `ServerRegistry::reserve`, `StartReservation::commit`
//!    - Tested by: `registry::tests::racing_starts_leave_exactly_one_handle`
//!    - Failure symptom: two listeners fight over one address, or a handle leaks and is never stopped.
//!
//! 2. The registry lock MUST NOT be held across a runner call or a stop action.
//!    - Enforced in: `ServerRegistry::start`, `ServerRegistry::stop`, `ServerRegistry::stop_all`
//!    - Tested by: `registry::tests::slow_stop_does_not_block_other_keys`
//!    - Failure symptom: one slow teardown freezes the console and the status monitor.
//!
//! 3. A stop action MUST NOT run again after it succeeded.
//!    - Enforced in: `ServerHandle::stop`
//!    - Tested by: `registry::tests::stop_is_idempotent_and_tears_down_once`
//!    - Failure symptom: a second teardown of an already released listener.
//!
//! 4. A failed start MUST leave the key absent.
//!    - Enforced in: `StartReservation` drop guard
//!    - Tested by: `registry::tests::failed_start_leaves_no_entry`, `registry::tests::cancelled_start_releases_its_reservation`
//!    - Failure symptom: a phantom entry blocks every later start with `StartInProgress`.
//!
//! 5. No handle is inserted once [`ServerRegistry::stop_all`] has begun.
//!    - Enforced in: `ServerRegistry::reserve`, `StartReservation::commit`
//!    - Tested by: `registry::tests::stop_all_tears_down_a_start_still_binding`
//!    - Failure symptom: a server bound during shutdown outlives the sweep and keeps its port.
//!
//! # Lifecycle
//!
//! `(absent) -> running -> stopped -> (absent, on restart) -> running -> ...`

mod error;
mod handle;
mod kind;
mod registry;
mod runner;
mod snapshot;

pub use error::{Operation, RegistryError, Result, RunnerError};
pub use handle::{ServerHandle, ServerStatus};
pub use kind::{InstanceKey, ServerKind};
pub use registry::{RegistryConfig, ServerRegistry, StopAllReport, StopFailure};
pub use runner::{Runner, RunnerSet, ServeSettings, Started, StopServer};
pub use snapshot::ServerSnapshot;
