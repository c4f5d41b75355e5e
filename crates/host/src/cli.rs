use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "downstream")]
#[command(about = "Start, stop and inspect HTTP, gRPC and TCP test servers at runtime")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Configuration file
	#[arg(short, long, value_name = "PATH", default_value = "./config.yaml")]
	pub config: PathBuf,

	/// Verbose logging
	#[arg(short, long)]
	pub verbose: bool,

	/// Do not redraw the status table every second (useful when piping)
	#[arg(long)]
	pub no_monitor: bool,

	/// Write log files here instead of the configured `log.log_path`
	#[arg(long, value_name = "PATH")]
	pub log_dir: Option<PathBuf>,
}
