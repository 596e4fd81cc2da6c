mod bench;
mod cli;
mod config;
mod dns;
mod error;
mod logging;
mod output;
mod pool;
mod resolver;
mod sampler;
mod sink;
mod stats;
mod transport;
mod work;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use crate::bench::{BenchContext, RoundOrchestrator};
use crate::cli::Cli;
use crate::config::Config;
use crate::resolver::NetworkResolver;
use crate::sink::{CsvSinkProvider, NullSinkProvider, SinkProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	// Configuration problems are fatal before any round starts
	let mut config = Config::load(&cli.config)?;
	config.apply_cli(&cli);
	config.validate()?;

	let log_file = if config.log_to_file {
		Some(config.log_file.as_path())
	} else {
		None
	};
	logging::init(cli.verbose, log_file)?;

	output::print_config_summary(&config);

	let resolver = NetworkResolver::new(config.record_type, config.timeout)
		.context("failed to set up DNS resolver")?;

	let sinks: Box<dyn SinkProvider> = if config.save_csv {
		Box::new(CsvSinkProvider::new(config.csv_dir.clone()))
	} else {
		Box::new(NullSinkProvider)
	};

	let ctx = BenchContext::new(config, Arc::new(resolver));
	let mut orchestrator = RoundOrchestrator::new(ctx, sinks)
		.with_summary_table(!cli.quiet);
	let summaries = orchestrator.run().await;
	for summary in &summaries {
		let no_data = summary.results.iter().filter(|r| r.average.is_none()).count();
		if no_data > 0 {
			warn!("round {}: {} pair(s) had no successful samples", summary.round, no_data);
		}
	}
	let total: std::time::Duration = summaries.iter().map(|s| s.elapsed).sum();
	info!("all {} rounds complete in {:.2?}", summaries.len(), total);

	Ok(())
}
