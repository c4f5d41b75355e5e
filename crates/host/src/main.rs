//! Downstream host binary.
//!
//! Starts the servers named in the configuration file, then lets an operator
//! start, stop and list HTTP, gRPC and TCP test servers from the console until
//! `exit`, end of input, SIGINT or SIGTERM.

use clap::Parser;

mod app;
mod cli;
mod logging;

#[cfg(test)]
mod tests;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = cli::Cli::parse();
	app::run(cli).await
}
