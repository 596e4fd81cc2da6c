use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL};

use crate::config::Config;
use crate::work::PairSummary;

/// Print a summary of the benchmark configuration before running.
pub fn print_config_summary(config: &Config) {
	println!("DNS Latency Benchmark Configuration");
	println!("===================================");
	println!("Domains:        {}", config.domains.len());
	for d in &config.domains {
		println!("  - {}", d);
	}
	println!("DNS servers:    {}", config.servers.len());
	for s in &config.servers {
		println!("  - {}", s);
	}
	println!("Record type:    {:?}", config.record_type);
	println!("Samples:        {}", config.test_count);
	println!("Interval:       {:?}", config.query_interval);
	println!("Timeout:        {:?}", config.timeout);
	println!("Concurrency:    {}", config.concurrency);
	println!("Rounds:         {}", config.test_rounds);
	if config.log_to_file {
		println!("Log file:       {}", config.log_file.display());
	}
	if config.save_csv {
		println!("CSV directory:  {}", config.csv_dir.display());
	}
	println!();
}

/// Build the per-round results table.
pub fn round_table(results: &[PairSummary]) -> Table {
	let mut table = Table::new();
	table.load_preset(UTF8_FULL);
	table.set_content_arrangement(ContentArrangement::Dynamic);
	table.set_header(vec![
		"Domain", "DNS server", "OK",
		"Avg", "Min", "p50", "Max", "Stddev",
	]);

	for r in results {
		let ok = format!("{}/{}", r.succeeded, r.attempted);
		let mut row = vec![r.item.domain.clone(), r.item.server.clone(), ok];
		match (r.average, &r.latency) {
			(Some(avg), Some(s)) => {
				row.push(format!("{:.2} ms", avg.as_secs_f64() * 1000.0));
				row.push(format!("{:.2} ms", s.min_ms));
				row.push(format!("{:.2} ms", s.p50_ms));
				row.push(format!("{:.2} ms", s.max_ms));
				row.push(format!("{:.2} ms", s.stddev_ms));
			}
			_ => {
				row.push("no data".to_string());
				row.extend(std::iter::repeat("-".to_string()).take(4));
			}
		}
		table.add_row(row);
	}
	table
}

/// Print the results of one round as a formatted table.
pub fn print_round_table(round: u32, results: &[PairSummary]) {
	println!("\nRound {} Results", round);
	println!("================\n");
	println!("{}", round_table(results));
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::work::{AggregateResult, SampleResult, WorkItem};
	use chrono::Local;
	use std::time::Duration;

	fn summary(domain: &str, latencies: &[u64], attempted: u32) -> PairSummary {
		let samples: Vec<SampleResult> = latencies.iter()
			.map(|&ms| SampleResult {
				domain: domain.to_string(),
				server: "8.8.8.8".to_string(),
				timestamp: Local::now(),
				latency: Duration::from_millis(ms),
			})
			.collect();
		let durations: Vec<Duration> = samples.iter().map(|s| s.latency).collect();
		AggregateResult {
			item: WorkItem {
				domain: domain.to_string(),
				server: "8.8.8.8".to_string(),
			},
			average: crate::stats::mean_duration(&durations),
			samples,
			attempted,
		}
		.into_summary()
	}

	#[test]
	fn test_round_table_rows() {
		let results = vec![
			summary("a.com", &[10, 20, 30], 3),
			summary("b.com", &[], 3),
		];
		let mut table = round_table(&results);
		table.set_content_arrangement(ContentArrangement::Disabled);
		let rendered = table.to_string();
		assert!(rendered.contains("a.com"));
		assert!(rendered.contains("20.00 ms"));
		assert!(rendered.contains("3/3"));
		assert!(rendered.contains("no data"));
		assert!(rendered.contains("0/3"));
	}
}
