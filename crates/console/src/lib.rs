//! Operator console for the downstream server host.
//!
//! The console is a consumer of the registry: [`Command::parse`] turns a line
//! into a [`Command`], [`dispatch`] runs it and produces the reply, and
//! [`Monitor`] redraws the status table every second. All terminal writes go
//! through one [`Output`] so replies and redraws never interleave.

mod command;
mod dispatch;
mod monitor;
mod output;
mod table;

pub use command::{Command, CommandError};
pub use dispatch::{Outcome, dispatch};
pub use monitor::{DEFAULT_INTERVAL, Monitor};
pub use output::{Output, PROMPT};
pub use table::{render_rows, render_table};
