use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::stats::{summarize, LatencySummary};

/// One (domain, DNS server) pair to measure
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
	pub domain: String,
	pub server: String,
}

impl fmt::Display for WorkItem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "domain: {} dns: {}", self.domain, self.server)
	}
}

/// Build the full domain x server matrix, domain-major.
///
/// Duplicates in either input are kept as-is.
pub fn build_matrix(domains: &[String], servers: &[String]) -> Vec<WorkItem> {
	let mut items = Vec::with_capacity(domains.len() * servers.len());
	for domain in domains {
		for server in servers {
			items.push(WorkItem {
				domain: domain.clone(),
				server: server.clone(),
			});
		}
	}
	items
}

/// A single successful measurement, as persisted to the record sink
#[derive(Debug, Clone)]
pub struct SampleResult {
	pub domain: String,
	pub server: String,
	pub timestamp: DateTime<Local>,
	pub latency: Duration,
}

/// Mean latency of one work item over its successful samples.
///
/// `average` is `None` when no sample succeeded.
#[derive(Debug, Clone)]
pub struct AggregateResult {
	pub item: WorkItem,
	pub average: Option<Duration>,
	/// Successful samples in the order they were taken
	pub samples: Vec<SampleResult>,
	/// Number of lookups attempted
	pub attempted: u32,
}

impl AggregateResult {
	pub fn succeeded(&self) -> usize {
		self.samples.len()
	}

	pub fn failed(&self) -> usize {
		self.attempted as usize - self.samples.len()
	}

	pub fn latencies_ms(&self) -> Vec<f64> {
		self.samples.iter()
			.map(|s| s.latency.as_secs_f64() * 1000.0)
			.collect()
	}

	/// Reduce to summary statistics, dropping the per-sample records.
	pub fn into_summary(self) -> PairSummary {
		let latency = summarize(&self.latencies_ms());
		PairSummary {
			succeeded: self.samples.len(),
			item: self.item,
			average: self.average,
			attempted: self.attempted,
			latency,
		}
	}
}

/// What is kept of a work item once its samples have been persisted
#[derive(Debug, Clone, PartialEq)]
pub struct PairSummary {
	pub item: WorkItem,
	pub average: Option<Duration>,
	pub succeeded: usize,
	pub attempted: u32,
	/// None when no sample succeeded
	pub latency: Option<LatencySummary>,
}
