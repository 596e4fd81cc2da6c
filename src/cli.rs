use std::path::PathBuf;

use clap::Parser;

/// DNS latency benchmark across domains and DNS servers
#[derive(Parser, Debug)]
#[command(name = "dns-latency-bench")]
#[command(about = "Measure DNS resolution latency for every domain x DNS server pair")]
pub struct Cli {
	/// YAML configuration file
	#[arg(short = 'c', long = "config", default_value = "config.yaml")]
	pub config: PathBuf,

	/// Number of test rounds (overrides test_rounds)
	#[arg(short = 'n', long = "rounds")]
	pub rounds: Option<u32>,

	/// Number of concurrent workers (overrides concurrency)
	#[arg(short = 'j', long = "concurrency")]
	pub concurrency: Option<usize>,

	/// Lookups per domain/server pair (overrides test_count)
	#[arg(long = "count")]
	pub count: Option<u32>,

	/// Do not write per-sample CSV files
	#[arg(long = "no-csv")]
	pub no_csv: bool,

	/// Log to stdout only, even if log_to_file is set
	#[arg(long = "no-log-file")]
	pub no_log_file: bool,

	/// Skip the per-round summary table
	#[arg(short = 'q', long = "quiet")]
	pub quiet: bool,

	/// Enable debug logging
	#[arg(short = 'v', long = "verbose")]
	pub verbose: bool,
}
